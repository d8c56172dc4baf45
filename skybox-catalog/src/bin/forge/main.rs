//! Forge: synthetic star catalog generator CLI
//!
//! Fills a file-backed catalog with points uniform per solid angle, in
//! committed batches that survive interruption.

mod cli;
mod generate;
mod info;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match &cli.command {
        Commands::Generate(args) => generate::run(args, &cli),
        Commands::Info(args) => info::run(args),
    }
}
