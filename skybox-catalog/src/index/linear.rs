//! Brute-force index: a flat `Vec` scanned on every query.
//!
//! Fine for a few thousand entries and used as the reference answer when
//! testing the other providers.

use super::{check_batch, CatalogEntry, SpatialIndex};
use skybox_core::{Bounds, Result};

#[derive(Debug, Default, Clone)]
pub struct LinearIndex {
    entries: Vec<CatalogEntry>,
    max_id: u64,
}

impl LinearIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl SpatialIndex for LinearIndex {
    fn insert_batch(&mut self, entries: &[CatalogEntry]) -> Result<()> {
        let max_id = check_batch(entries, self.max_id)?;
        self.entries.extend_from_slice(entries);
        self.max_id = max_id;
        Ok(())
    }

    fn range_query(&self, bounds: &Bounds) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.bounds.intersects(bounds))
            .copied()
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn max_id(&self) -> u64 {
        self.max_id
    }

    fn reset(&mut self) -> Result<()> {
        self.entries.clear();
        self.max_id = 0;
        Ok(())
    }
}
