use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use skybox_catalog::index::FileIndex;
use skybox_catalog::query::{ConeQuery, MatchRecord, QueryEngine};
use skybox_catalog::store::CatalogStore;
use skybox_core::angle::AngleUnits;
use skybox_core::{Angle, HalfWidth};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum RaUnit {
    Hours,
    Degrees,
}

#[derive(Parser)]
#[command(name = "query-catalog")]
#[command(about = "Cone queries against a Cartesian-box star catalog")]
struct Cli {
    /// Path to the catalog file
    #[arg(long)]
    catalog: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the chord half-width, a box that always contains the whole cone
    #[arg(long, global = true)]
    chord: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print catalog information
    Info,
    /// Perform a cone search
    Search {
        /// Right ascension (degrees, or HMS e.g. 18h36m56s, 18:36:56)
        ra: String,
        /// Declination (degrees, or DMS e.g. +38d47m01s, -5:22:30)
        dec: String,
        /// Search radius in arcminutes
        #[arg(long, default_value = "5.0")]
        radius_arcmin: f64,
        /// Faintest magnitude to return
        #[arg(long, default_value = "14.0")]
        mag_max: f64,
        /// Maximum number of results (closest first)
        #[arg(long)]
        limit: Option<usize>,
        /// Print query timing
        #[arg(long)]
        timing: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Count matches for every "ra dec" line of a file
    Batch {
        /// Input file, one "ra dec" pair per line; blank lines and # comments skipped
        #[arg(long)]
        input: PathBuf,
        /// Unit of decimal RA values in the input
        #[arg(long, value_enum, default_value = "degrees")]
        ra_unit: RaUnit,
        /// Search radius in arcminutes
        #[arg(long, default_value = "5.0")]
        radius_arcmin: f64,
        /// Faintest magnitude to count
        #[arg(long, default_value = "14.0")]
        mag_max: f64,
        /// Print query timing
        #[arg(long)]
        timing: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let policy = if cli.chord {
        HalfWidth::Chord
    } else {
        HalfWidth::Sine
    };

    let index = FileIndex::open(&cli.catalog)
        .with_context(|| format!("Failed to open catalog: {:?}", cli.catalog))?;

    match cli.command {
        Commands::Info => {
            println!("{}", index.header());
            let store = CatalogStore::new(index);
            println!("{}", store.stats()?);
        }
        Commands::Search {
            ra,
            dec,
            radius_arcmin,
            mag_max,
            limit,
            timing,
            format,
        } => {
            let store = CatalogStore::new(index);
            let engine = QueryEngine::new(&store).with_half_width(policy);

            let query = ConeQuery::new(
                parse_ra(&ra, RaUnit::Degrees)?,
                parse_dec(&dec)?,
                Angle::from_arcminutes(radius_arcmin),
                mag_max,
            );

            let start = Instant::now();
            let matches = engine.nearest(&query)?;
            let mut records = matches.records()?;
            if timing {
                eprintln!(
                    "Query completed in {:.2} ms",
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            if let Some(limit) = limit {
                records.truncate(limit);
            }

            match format {
                OutputFormat::Table => print_table(&records),
                OutputFormat::Json => print_json(&records)?,
                OutputFormat::Csv => print_csv(&records),
            }
        }
        Commands::Batch {
            input,
            ra_unit,
            radius_arcmin,
            mag_max,
            timing,
        } => {
            let store = CatalogStore::new(index);
            let engine = QueryEngine::new(&store).with_half_width(policy);
            let text = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read batch input: {:?}", input))?;
            let radius = Angle::from_arcminutes(radius_arcmin);

            let parsed = parse_batch(&text, ra_unit, radius, mag_max);
            let queries: Vec<ConeQuery> = parsed.iter().filter_map(|p| p.as_ref().ok()).copied().collect();

            let start = Instant::now();
            let mut counts = engine.count_batch(&queries).into_iter();
            if timing {
                eprintln!(
                    "{} queries completed in {:.2} ms",
                    queries.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }

            for line in parsed {
                match line {
                    Ok(_) => match counts.next() {
                        Some(Ok(n)) => println!("{}", n),
                        Some(Err(e)) => println!("error: {}", e),
                        None => println!("error: missing result"),
                    },
                    Err(e) => println!("error: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// One query (or parse error) per non-blank, non-comment line, in file order.
fn parse_batch(
    text: &str,
    ra_unit: RaUnit,
    radius: Angle,
    mag_max: f64,
) -> Vec<anyhow::Result<ConeQuery>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let t = line.trim();
            !t.is_empty() && !t.starts_with('#')
        })
        .map(|(i, line)| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(ra), Some(dec), None) => Ok(ConeQuery::new(
                    parse_ra(ra, ra_unit)?,
                    parse_dec(dec)?,
                    radius,
                    mag_max,
                )),
                _ => anyhow::bail!("line {}: expected \"ra dec\", got {:?}", i + 1, line.trim()),
            }
        })
        .collect()
}

fn print_table(records: &[MatchRecord]) {
    for (i, r) in records.iter().enumerate() {
        println!(
            "{:4}: {:>10} RA={:.6}° Dec={:+.6}° Mag={:5.2} Dist={:.4}'",
            i + 1,
            r.id,
            r.ra.degrees(),
            r.dec.degrees(),
            r.magnitude,
            r.separation.arcminutes()
        );
    }

    if records.is_empty() {
        println!("No objects found matching the search criteria.");
    } else {
        println!("\nTotal results: {}", records.len());
    }
}

#[derive(serde::Serialize)]
struct JsonMatch {
    id: u64,
    ra_deg: f64,
    dec_deg: f64,
    mag: f64,
    distance_arcmin: f64,
}

fn print_json(records: &[MatchRecord]) -> anyhow::Result<()> {
    let out: Vec<JsonMatch> = records
        .iter()
        .map(|r| JsonMatch {
            id: r.id,
            ra_deg: r.ra.degrees(),
            dec_deg: r.dec.degrees(),
            mag: r.magnitude,
            distance_arcmin: r.separation.arcminutes(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_csv(records: &[MatchRecord]) {
    println!("id,ra_deg,dec_deg,mag,distance_arcmin");
    for r in records {
        println!(
            "{},{},{},{},{}",
            r.id,
            r.ra.degrees(),
            r.dec.degrees(),
            r.magnitude,
            r.separation.arcminutes()
        );
    }
}

fn parse_ra(s: &str, unit: RaUnit) -> anyhow::Result<Angle> {
    let decimal = |s: &str| match unit {
        RaUnit::Hours => s.hours(),
        RaUnit::Degrees => s.deg(),
    };
    s.hms()
        .or_else(|_| decimal(s))
        .map_err(|e| anyhow::anyhow!("Cannot parse RA '{}': {}", s, e))
}

fn parse_dec(s: &str) -> anyhow::Result<Angle> {
    s.dms()
        .or_else(|_| s.deg())
        .map_err(|e| anyhow::anyhow!("Cannot parse Dec '{}': {}", s, e))
}
