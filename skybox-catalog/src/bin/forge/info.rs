//! Print header and statistics of a catalog file.

use crate::cli::InfoArgs;
use anyhow::Context;
use skybox_catalog::index::FileIndex;
use skybox_catalog::store::CatalogStore;

pub fn run(args: &InfoArgs) -> anyhow::Result<()> {
    let index = FileIndex::open(&args.catalog)
        .with_context(|| format!("Failed to open catalog: {:?}", args.catalog))?;
    let file_size = std::fs::metadata(&args.catalog)?.len();
    println!("{}", index.header());

    let store = CatalogStore::new(index);
    let stats = store.stats()?;
    println!("{}", stats);
    println!(
        "File size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1_048_576.0
    );
    if !stats.on_unit_sphere() {
        println!("WARNING: some positions are off the unit sphere");
    }
    Ok(())
}
