//! Spatial index contract and providers.
//!
//! The store never looks inside an index. It needs exactly two things from
//! one: an atomic batch insert of four-axis boxes keyed by id, and a
//! closed-interval box-intersection query. Anything that can do that (an
//! R-tree, a database table with six numeric columns, a flat scan) implements
//! [`SpatialIndex`].
//!
//! | Provider | Storage | Query cost |
//! |----------|---------|------------|
//! | [`LinearIndex`] | `Vec` in memory | O(n) scan |
//! | [`GridIndex`] | uniform bucket grid over `[-1, 1]³` | cells overlapping the box |
//! | [`FileIndex`] | append-only file + in-memory grid mirror | same as grid |

pub mod file;
pub mod grid;
pub mod linear;

pub use file::FileIndex;
pub use grid::GridIndex;
pub use linear::LinearIndex;

use skybox_core::{Bounds, Error, Result, Vector3};

/// One stored catalog object.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogEntry {
    pub id: u64,
    pub bounds: Bounds,
}

impl CatalogEntry {
    /// Degenerate entry for a point object.
    pub fn point(id: u64, position: &Vector3, magnitude: f64) -> Self {
        Self {
            id,
            bounds: Bounds::point(position, magnitude),
        }
    }

    /// Stored position (box center for extended entries).
    pub fn position(&self) -> Vector3 {
        self.bounds.center()
    }

    pub fn magnitude(&self) -> f64 {
        self.bounds.magnitude()
    }
}

/// Box-intersection index over catalog entries.
///
/// Implementations must be `Send + Sync` so a store can be shared by
/// parallel readers. Writes take `&mut self`; there is one writer at a time.
pub trait SpatialIndex: Send + Sync {
    /// Add a batch of entries. Either every entry becomes visible or none
    /// does.
    ///
    /// # Errors
    /// [`Error::Storage`] if the batch is rejected or cannot be persisted.
    fn insert_batch(&mut self, entries: &[CatalogEntry]) -> Result<()>;

    fn insert(&mut self, entry: CatalogEntry) -> Result<()> {
        self.insert_batch(std::slice::from_ref(&entry))
    }

    /// Every entry whose box intersects `bounds` on all four axes
    /// (closed intervals). Order is provider-specific.
    fn range_query(&self, bounds: &Bounds) -> Result<Vec<CatalogEntry>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest id stored, 0 when empty.
    fn max_id(&self) -> u64;

    /// Drop every entry. Succeeds on an index that was never written.
    fn reset(&mut self) -> Result<()>;
}

impl<T: SpatialIndex + ?Sized> SpatialIndex for Box<T> {
    fn insert_batch(&mut self, entries: &[CatalogEntry]) -> Result<()> {
        (**self).insert_batch(entries)
    }

    fn insert(&mut self, entry: CatalogEntry) -> Result<()> {
        (**self).insert(entry)
    }

    fn range_query(&self, bounds: &Bounds) -> Result<Vec<CatalogEntry>> {
        (**self).range_query(bounds)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn max_id(&self) -> u64 {
        (**self).max_id()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

/// Checks a batch against the write rules shared by every provider and
/// returns the batch's largest id.
///
/// Ids must be non-zero and strictly increasing above `current_max`; bounds
/// must be finite with `min ≤ max` on each axis.
pub(crate) fn check_batch(entries: &[CatalogEntry], current_max: u64) -> Result<u64> {
    let mut last = current_max;
    for entry in entries {
        if entry.id <= last {
            return Err(Error::storage(
                "insert_batch",
                format!(
                    "write rejected: id {} not above previous id {}",
                    entry.id, last
                ),
            ));
        }
        if !entry.bounds.is_finite() || !entry.bounds.is_well_formed() {
            return Err(Error::storage(
                "insert_batch",
                format!("write rejected: malformed bounds for id {}: {}", entry.id, entry.bounds),
            ));
        }
        last = entry.id;
    }
    Ok(last)
}
