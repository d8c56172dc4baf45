//! Catalog store: id assignment, batched commits and magnitude filtering on
//! top of an injected [`SpatialIndex`].
//!
//! Every write goes through a [`Transaction`]. A single [`CatalogStore::insert`]
//! is a one-entry transaction; [`CatalogStore::insert_many`] opens one
//! transaction per `batch_size` points. Ids are reserved when a point is
//! staged and handed back if the transaction is rolled back or dropped, so
//! the committed ids of a catalog are always `1..=max_id` without gaps.

use crate::index::{CatalogEntry, SpatialIndex};
use log::{debug, info};
use skybox_core::constants::UNIT_NORM_TOLERANCE;
use skybox_core::{Bounds, Error, Result, Vector3};
use std::fmt;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Store tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreConfig {
    /// Points per commit in [`CatalogStore::insert_many`].
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::configuration("batch_size", "must be > 0"));
        }
        Ok(())
    }
}

/// Point catalog backed by a spatial index.
pub struct CatalogStore<I: SpatialIndex> {
    index: I,
    config: StoreConfig,
    next_id: u64,
}

impl<I: SpatialIndex> CatalogStore<I> {
    /// Wrap an index with the default configuration. Ids continue after
    /// whatever the index already holds.
    pub fn new(index: I) -> Self {
        let next_id = index.max_id() + 1;
        Self {
            index,
            config: StoreConfig::default(),
            next_id,
        }
    }

    pub fn with_config(index: I, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let mut store = Self::new(index);
        store.config = config;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn into_index(self) -> I {
        self.index
    }

    /// Committed entry count.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Id the next staged point will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Insert one point and commit it immediately.
    pub fn insert(&mut self, direction: &Vector3, magnitude: f64) -> Result<u64> {
        let mut tx = self.transaction();
        let id = tx.insert(direction, magnitude)?;
        tx.commit()?;
        Ok(id)
    }

    /// Insert a stream of `(direction, magnitude)` points, committing every
    /// `batch_size` points. On error the failing batch is rolled back and
    /// earlier batches stay committed.
    pub fn insert_many<P>(&mut self, points: P) -> Result<Vec<u64>>
    where
        P: IntoIterator<Item = (Vector3, f64)>,
    {
        let batch_size = self.config.batch_size;
        let mut ids = Vec::new();
        let mut iter = points.into_iter().peekable();
        while iter.peek().is_some() {
            let mut tx = self.transaction();
            for (direction, magnitude) in iter.by_ref().take(batch_size) {
                ids.push(tx.insert(&direction, magnitude)?);
            }
            tx.commit()?;
        }
        Ok(ids)
    }

    /// Open a scoped batch. Nothing is visible until
    /// [`Transaction::commit`]; dropping the guard rolls back.
    pub fn transaction(&mut self) -> Transaction<'_, I> {
        let first_id = self.next_id;
        Transaction {
            store: self,
            staged: Vec::new(),
            first_id,
            finished: false,
        }
    }

    /// Entries intersecting `bounds` whose magnitude upper bound is at most
    /// `mag_ceiling`. Order is whatever the index returns.
    ///
    /// # Errors
    /// [`Error::Configuration`] for NaN or inverted bounds or a NaN ceiling;
    /// otherwise whatever the index reports.
    pub fn range_query(&self, bounds: &Bounds, mag_ceiling: f64) -> Result<Vec<CatalogEntry>> {
        if !bounds.is_well_formed() {
            return Err(Error::configuration(
                "bounds",
                format!("query box is not well formed: {}", bounds),
            ));
        }
        if mag_ceiling.is_nan() {
            return Err(Error::configuration("mag_ceiling", "magnitude ceiling is NaN"));
        }
        let mut hits = self.index.range_query(bounds)?;
        hits.retain(|e| e.bounds.m.max <= mag_ceiling);
        Ok(hits)
    }

    /// Drop the whole catalog. Safe to call on an empty or never-written
    /// index.
    pub fn reset(&mut self) -> Result<()> {
        self.index.reset()?;
        self.next_id = 1;
        info!("Catalog reset");
        Ok(())
    }

    /// Summary of the committed catalog. Scans every entry.
    pub fn stats(&self) -> Result<CatalogStats> {
        let entries = self.index.range_query(&Bounds::unbounded())?;
        Ok(CatalogStats::from_entries(&entries, self.index.max_id()))
    }
}

/// A staged batch of inserts.
///
/// Created by [`CatalogStore::transaction`]. Ids are reserved as points are
/// staged. [`commit`](Self::commit) hands the whole batch to the index in one
/// call; [`rollback`](Self::rollback) or dropping the guard discards it and
/// releases the reserved ids.
pub struct Transaction<'a, I: SpatialIndex> {
    store: &'a mut CatalogStore<I>,
    staged: Vec<CatalogEntry>,
    first_id: u64,
    finished: bool,
}

impl<I: SpatialIndex> Transaction<'_, I> {
    /// Stage a point. Non-unit directions are normalized.
    ///
    /// # Errors
    /// [`Error::Domain`] for zero or non-finite directions and non-finite
    /// magnitudes.
    pub fn insert(&mut self, direction: &Vector3, magnitude: f64) -> Result<u64> {
        if !magnitude.is_finite() {
            return Err(Error::domain(
                "insert",
                format!("magnitude must be finite, got {}", magnitude),
            ));
        }
        let position = if direction.is_finite() && direction.is_unit() {
            *direction
        } else {
            direction.normalize()?
        };
        let id = self.store.next_id;
        self.store.next_id += 1;
        self.staged.push(CatalogEntry::point(id, &position, magnitude));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Ids reserved so far, in staging order.
    pub fn staged_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.staged.iter().map(|e| e.id)
    }

    /// Make the batch visible. Returns the number of committed entries.
    ///
    /// On failure nothing from this batch is visible and its ids are
    /// released.
    pub fn commit(mut self) -> Result<usize> {
        let n = self.staged.len();
        let result = self.store.index.insert_batch(&self.staged);
        if result.is_ok() {
            self.finished = true;
            debug!(
                "Committed batch of {} (ids {}..{})",
                n, self.first_id, self.store.next_id
            );
        }
        // on error Drop restores next_id
        result.map(|()| n)
    }

    pub fn rollback(self) {}
}

impl<I: SpatialIndex> Drop for Transaction<'_, I> {
    fn drop(&mut self) {
        if !self.finished {
            if !self.staged.is_empty() {
                debug!(
                    "Rolled back batch of {} (ids {}..{})",
                    self.staged.len(),
                    self.first_id,
                    self.store.next_id
                );
            }
            self.store.next_id = self.first_id;
        }
    }
}

/// Magnitude summary over a catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Catalog-wide statistics from [`CatalogStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogStats {
    pub count: usize,
    pub max_id: u64,
    /// `None` for an empty catalog.
    pub magnitude: Option<MagnitudeSummary>,
    /// Largest `| |v|² − 1 |` over stored positions.
    pub max_norm_deviation: f64,
}

impl CatalogStats {
    pub fn from_entries(entries: &[CatalogEntry], max_id: u64) -> Self {
        let mut deviation: f64 = 0.0;
        let mut summary: Option<MagnitudeSummary> = None;
        let mut sum = 0.0;
        for e in entries {
            deviation = deviation.max((e.position().magnitude_squared() - 1.0).abs());
            let m = e.magnitude();
            sum += m;
            summary = Some(match summary {
                None => MagnitudeSummary {
                    min: m,
                    max: m,
                    mean: 0.0,
                },
                Some(s) => MagnitudeSummary {
                    min: s.min.min(m),
                    max: s.max.max(m),
                    mean: 0.0,
                },
            });
        }
        if let Some(s) = summary.as_mut() {
            s.mean = sum / entries.len() as f64;
        }
        Self {
            count: entries.len(),
            max_id,
            magnitude: summary,
            max_norm_deviation: deviation,
        }
    }

    /// Every stored position lies on the unit sphere.
    pub fn on_unit_sphere(&self) -> bool {
        self.max_norm_deviation <= UNIT_NORM_TOLERANCE
    }
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entries: {}", self.count)?;
        writeln!(f, "Max id: {}", self.max_id)?;
        match self.magnitude {
            Some(m) => {
                writeln!(f, "Magnitude range: {:.3} .. {:.3}", m.min, m.max)?;
                writeln!(f, "Mean magnitude: {:.3}", m.mean)?;
            }
            None => writeln!(f, "Magnitude range: -")?,
        }
        write!(f, "Max unit-norm deviation: {:.3e}", self.max_norm_deviation)
    }
}
