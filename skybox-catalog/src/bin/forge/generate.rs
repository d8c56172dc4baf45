//! Generate a file-backed synthetic catalog.

use crate::cli::{Cli, GenerateArgs};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use skybox_catalog::generate::{CatalogGenerator, GeneratorConfig};
use skybox_catalog::index::{FileIndex, GridIndex};
use skybox_catalog::store::{CatalogStore, StoreConfig};
use skybox_core::Angle;

pub fn run(args: &GenerateArgs, cli: &Cli) -> anyhow::Result<()> {
    let config = GeneratorConfig {
        total: args.count,
        batch_size: args.batch_size,
        mag_max: args.mag_max,
        dec_cap: match (args.cap_min, args.cap_max) {
            (Some(lo), Some(hi)) => Some((Angle::from_degrees(lo), Angle::from_degrees(hi))),
            _ => None,
        },
        seed: args.seed,
        resume: args.resume,
    };
    let generator = CatalogGenerator::new(config).context("Invalid generator settings")?;
    print_plan(args, cli);

    let grid = GridIndex::with_cells(args.grid_cells)?;
    let index = if args.resume && args.output.exists() {
        FileIndex::open_with_grid(&args.output, grid)
    } else {
        FileIndex::create_with_grid(&args.output, grid)
    }
    .with_context(|| format!("Failed to prepare catalog file: {:?}", args.output))?;

    let store_config = StoreConfig {
        batch_size: args.batch_size,
    };
    let mut store = CatalogStore::with_config(index, store_config)?;

    let pb = create_progress_bar(args.count);
    pb.set_position(store.len() as u64);
    let report = generator
        .run_with_progress(&mut store, |p| pb.set_position(p.committed))
        .with_context(|| {
            format!(
                "Generation stopped; {} points are committed in {:?}, rerun with --resume",
                store.len(),
                args.output
            )
        });
    pb.finish_and_clear();
    let report = report?;

    println!("{}", report);
    println!("Output: {:?}", args.output);
    Ok(())
}

fn print_plan(args: &GenerateArgs, cli: &Cli) {
    println!("=== Generate Catalog ===");
    println!("Output: {:?}", args.output);
    println!("Points: {}", args.count);
    println!("Batch size: {}", args.batch_size);
    println!("Magnitude range: [0, {})", args.mag_max);
    match (args.cap_min, args.cap_max) {
        (Some(lo), Some(hi)) => println!("Declination cap: {}° <= |dec| <= {}°", lo, hi),
        _ => println!("Declination cap: full sphere"),
    }
    match args.seed {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: random"),
    }
    println!("Resume: {}", args.resume);
    println!("Verbose: {}", cli.verbose);
    println!();
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
