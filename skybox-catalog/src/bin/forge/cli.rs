//! CLI argument definitions for forge

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Synthetic star catalog generator")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a catalog of random point objects
    Generate(GenerateArgs),

    /// Print catalog statistics
    Info(InfoArgs),
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Output catalog file
    #[arg(long)]
    pub output: PathBuf,

    /// Total number of points in the finished catalog
    #[arg(long, default_value = "1000000")]
    pub count: u64,

    /// Points per committed batch
    #[arg(long, default_value = "10000")]
    pub batch_size: usize,

    /// Magnitudes are drawn uniformly from [0, mag-max)
    #[arg(long, default_value = "14.0")]
    pub mag_max: f64,

    /// Lower |dec| bound of the sampling cap, in degrees
    #[arg(long, requires = "cap_max")]
    pub cap_min: Option<f64>,

    /// Upper |dec| bound of the sampling cap, in degrees
    #[arg(long, requires = "cap_min")]
    pub cap_max: Option<f64>,

    /// RNG seed for a reproducible catalog
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep committed points in an existing file and add the rest
    #[arg(long)]
    pub resume: bool,

    /// Grid cells per axis in the in-memory index
    #[arg(long, default_value = "32")]
    pub grid_cells: usize,
}

#[derive(Parser)]
pub struct InfoArgs {
    /// Catalog file
    #[arg(long)]
    pub catalog: PathBuf,
}
