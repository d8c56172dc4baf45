//! Star catalog stored as Cartesian bounding boxes.
//!
//! Each object is kept as a degenerate four-axis box `(x, y, z, m)`: its unit
//! vector on the celestial sphere plus apparent magnitude. A cone search
//! becomes an axis-aligned box query, so the same code path serves the
//! equator, the poles and the RA = 0°/360° seam.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`index`] | [`SpatialIndex`](index::SpatialIndex) contract, [`LinearIndex`](index::LinearIndex), [`GridIndex`](index::GridIndex), persistent [`FileIndex`](index::FileIndex) |
//! | [`store`] | [`CatalogStore`](store::CatalogStore): id assignment, scoped [`Transaction`](store::Transaction)s, magnitude filter, stats |
//! | [`query`] | [`QueryEngine`](query::QueryEngine): single and parallel batch cone queries |
//! | [`generate`] | [`CatalogGenerator`](generate::CatalogGenerator): uniform-per-solid-angle synthetic catalogs |
//!
//! # Quick Start
//!
//! ```
//! use skybox_catalog::generate::{CatalogGenerator, GeneratorConfig};
//! use skybox_catalog::index::GridIndex;
//! use skybox_catalog::query::{ConeQuery, QueryEngine};
//! use skybox_catalog::store::CatalogStore;
//! use skybox_core::Angle;
//!
//! let mut store = CatalogStore::new(GridIndex::new());
//! let config = GeneratorConfig { total: 5_000, seed: Some(1), ..Default::default() };
//! CatalogGenerator::new(config)?.run(&mut store)?;
//!
//! let engine = QueryEngine::new(&store);
//! let query = ConeQuery::new(
//!     Angle::from_degrees(83.633),
//!     Angle::from_degrees(-5.375),
//!     Angle::from_degrees(2.0),
//!     12.0,
//! );
//! let matches = engine.nearest(&query)?;
//! println!("{} objects in box", matches.len());
//! # Ok::<(), skybox_core::Error>(())
//! ```
//!
//! # Binary Format
//!
//! [`FileIndex`](index::FileIndex) persists a catalog as a 64-byte header
//! followed by 72-byte little-endian records. The header's record count is
//! the commit point; see [`index::file`].
//!
//! # Features
//!
//! - **`cli`** — Enables the `forge` and `query-catalog` binaries for
//!   generating and querying catalogs from the command line.
//! - **`serde`** — `Serialize`/`Deserialize` for entries, queries and configs.

pub mod generate;
pub mod index;
pub mod query;
pub mod store;

pub use generate::{CatalogGenerator, GenerationReport, GeneratorConfig};
pub use index::{CatalogEntry, FileIndex, GridIndex, LinearIndex, SpatialIndex};
pub use query::{ConeQuery, QueryEngine, QueryMatches};
pub use store::{CatalogStats, CatalogStore, StoreConfig, Transaction};
