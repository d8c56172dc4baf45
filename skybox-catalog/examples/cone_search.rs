use skybox_catalog::generate::{CatalogGenerator, GeneratorConfig};
use skybox_catalog::index::FileIndex;
use skybox_catalog::query::{ConeQuery, QueryEngine};
use skybox_catalog::store::CatalogStore;
use skybox_core::Angle;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "cone_search_demo.skyb".to_string());

    let index = FileIndex::open_or_create(&path)?;
    let mut store = CatalogStore::new(index);
    if store.is_empty() {
        let config = GeneratorConfig {
            total: 100_000,
            seed: Some(42),
            ..GeneratorConfig::default()
        };
        let report = CatalogGenerator::new(config)?.run(&mut store)?;
        println!("{}\n", report);
    }
    println!("{}", store.stats()?);

    let query = ConeQuery::new(
        Angle::from_degrees(83.633),
        Angle::from_degrees(-5.375),
        Angle::from_arcminutes(30.0),
        10.0,
    );
    let engine = QueryEngine::new(&store);
    let records = engine.nearest(&query)?.records()?;
    println!(
        "\n{} objects within the {:.1}' box around ({:.3}, {:.3}):\n",
        records.len(),
        query.radius.arcminutes(),
        query.ra.degrees(),
        query.dec.degrees(),
    );

    for r in &records {
        println!(
            "  {:>8}  RA {:.6}°  Dec {:+.6}°  mag {:.2}  dist {:.3}'",
            r.id,
            r.ra.degrees(),
            r.dec.degrees(),
            r.magnitude,
            r.separation.arcminutes(),
        );
    }

    Ok(())
}
