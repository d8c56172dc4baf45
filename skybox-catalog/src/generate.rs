//! Synthetic catalog generation.
//!
//! [`CatalogGenerator`] draws positions from a [`SphereSampler`] (uniform per
//! solid angle, optionally inside a declination cap) and writes them through
//! [`CatalogStore`] transactions of `batch_size` points. Each batch is
//! committed before the next is drawn, so a storage failure loses at most the
//! batch in flight and a later run with `resume` picks up from the committed
//! count.

use crate::index::SpatialIndex;
use crate::store::{CatalogStore, DEFAULT_BATCH_SIZE};
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skybox_core::{Angle, DecCap, Error, Result, SphereSampler};
use std::fmt;
use std::time::{Duration, Instant};

/// Generation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Target catalog size N.
    pub total: u64,
    pub batch_size: usize,
    /// Magnitudes are drawn uniformly from `[0, mag_max)`.
    pub mag_max: f64,
    /// `|dec|` bounds; `None` covers the whole sphere.
    pub dec_cap: Option<(Angle, Angle)>,
    /// Fixed RNG seed for reproducible catalogs.
    pub seed: Option<u64>,
    /// Keep committed entries and only add the missing `N − len`.
    pub resume: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            total: 1_000_000,
            batch_size: DEFAULT_BATCH_SIZE,
            mag_max: 14.0,
            dec_cap: None,
            seed: None,
            resume: false,
        }
    }
}

impl GeneratorConfig {
    /// # Errors
    /// [`Error::Configuration`] for a zero batch size, a bad magnitude bound
    /// or cap bounds outside `0 ≤ a0 ≤ a1 ≤ 90°`.
    pub fn validate(&self) -> Result<DecCap> {
        if self.batch_size == 0 {
            return Err(Error::configuration("batch_size", "must be > 0"));
        }
        if !self.mag_max.is_finite() || self.mag_max <= 0.0 {
            return Err(Error::configuration(
                "mag_max",
                format!("must be finite and > 0, got {}", self.mag_max),
            ));
        }
        match self.dec_cap {
            Some((min, max)) => DecCap::new(min, max),
            None => Ok(DecCap::full_sphere()),
        }
    }
}

/// Progress after each committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationProgress {
    /// Catalog size after the batch.
    pub committed: u64,
    pub target: u64,
    pub batches: u64,
}

/// Outcome of a [`CatalogGenerator::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    pub requested: u64,
    /// Entries kept from an earlier run (0 unless resuming).
    pub already_present: u64,
    pub inserted: u64,
    pub batches: u64,
    pub elapsed: Duration,
}

impl GenerationReport {
    pub fn rate_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.inserted as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Requested: {}", self.requested)?;
        writeln!(f, "Already present: {}", self.already_present)?;
        writeln!(f, "Inserted: {}", self.inserted)?;
        writeln!(f, "Batches committed: {}", self.batches)?;
        write!(
            f,
            "Elapsed: {:.2}s ({:.0} points/s)",
            self.elapsed.as_secs_f64(),
            self.rate_per_sec()
        )
    }
}

/// Populates a [`CatalogStore`] with random point objects.
#[derive(Debug, Clone)]
pub struct CatalogGenerator {
    config: GeneratorConfig,
    cap: DecCap,
}

impl CatalogGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let cap = config.validate()?;
        Ok(Self { config, cap })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn run<I: SpatialIndex>(&self, store: &mut CatalogStore<I>) -> Result<GenerationReport> {
        self.run_with_progress(store, |_| {})
    }

    /// Like [`run`](Self::run), calling `progress` after every committed
    /// batch.
    pub fn run_with_progress<I, F>(
        &self,
        store: &mut CatalogStore<I>,
        mut progress: F,
    ) -> Result<GenerationReport>
    where
        I: SpatialIndex,
        F: FnMut(&GenerationProgress),
    {
        let start = Instant::now();
        let target = self.config.total;

        if !self.config.resume {
            store.reset()?;
        }
        let already_present = store.len() as u64;
        let remaining = target.saturating_sub(already_present);

        // a resumed run must not replay the points already drawn
        let rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(already_present)),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut sampler = SphereSampler::new(rng, self.cap, self.config.mag_max)?;

        info!(
            "Generating {} points ({} already present, cap {:.3}..{:.3}, mag < {})",
            remaining,
            already_present,
            self.cap.min(),
            self.cap.max(),
            self.config.mag_max
        );

        let mut inserted = 0u64;
        let mut batches = 0u64;
        while inserted < remaining {
            let n = (remaining - inserted).min(self.config.batch_size as u64) as usize;
            let mut tx = store.transaction();
            for sample in sampler.by_ref().take(n) {
                tx.insert(&sample.direction(), sample.magnitude)?;
            }
            tx.commit()?;
            inserted += n as u64;
            batches += 1;

            let p = GenerationProgress {
                committed: already_present + inserted,
                target,
                batches,
            };
            debug!("Batch {} committed ({}/{})", batches, p.committed, target);
            progress(&p);
        }

        let report = GenerationReport {
            requested: target,
            already_present,
            inserted,
            batches,
            elapsed: start.elapsed(),
        };
        info!(
            "Generated {} points in {} batches ({:.2}s)",
            inserted,
            batches,
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{CatalogEntry, LinearIndex};
    use skybox_core::{Bounds, Vector3};

    fn config(total: u64, batch_size: usize) -> GeneratorConfig {
        GeneratorConfig {
            total,
            batch_size,
            seed: Some(7),
            ..GeneratorConfig::default()
        }
    }

    fn all(store: &CatalogStore<LinearIndex>) -> Vec<CatalogEntry> {
        store
            .range_query(&Bounds::unbounded(), f64::INFINITY)
            .unwrap()
    }

    #[test]
    fn generates_requested_count_in_batches() {
        let mut store = CatalogStore::new(LinearIndex::new());
        let mut seen = Vec::new();
        let report = CatalogGenerator::new(config(250, 100))
            .unwrap()
            .run_with_progress(&mut store, |p| seen.push(p.committed))
            .unwrap();
        assert_eq!(store.len(), 250);
        assert_eq!(report.inserted, 250);
        assert_eq!(report.batches, 3);
        assert_eq!(seen, vec![100, 200, 250]);
    }

    #[test]
    fn generated_points_respect_invariants() {
        let mut store = CatalogStore::new(LinearIndex::new());
        let mut cfg = config(2_000, 500);
        cfg.dec_cap = Some((Angle::from_degrees(30.0), Angle::from_degrees(60.0)));
        cfg.mag_max = 10.0;
        CatalogGenerator::new(cfg).unwrap().run(&mut store).unwrap();

        let stats = store.stats().unwrap();
        assert!(stats.on_unit_sphere());
        for e in all(&store) {
            assert!(e.bounds.is_point());
            let z = e.position().z.abs();
            assert!(z >= Angle::from_degrees(30.0).sin() - 1e-12);
            assert!(z <= Angle::from_degrees(60.0).sin() + 1e-12);
            assert!((0.0..10.0).contains(&e.magnitude()));
        }
    }

    #[test]
    fn without_resume_existing_catalog_is_replaced() {
        let mut store = CatalogStore::new(LinearIndex::new());
        store.insert(&Vector3::x_axis(), 1.0).unwrap();
        let report = CatalogGenerator::new(config(10, 4))
            .unwrap()
            .run(&mut store)
            .unwrap();
        assert_eq!(report.already_present, 0);
        assert_eq!(store.len(), 10);
        assert_eq!(store.index().max_id(), 10);
    }

    #[test]
    fn resume_tops_up_to_target() {
        let mut store = CatalogStore::new(LinearIndex::new());
        CatalogGenerator::new(config(30, 10))
            .unwrap()
            .run(&mut store)
            .unwrap();

        let mut cfg = config(75, 10);
        cfg.resume = true;
        let report = CatalogGenerator::new(cfg).unwrap().run(&mut store).unwrap();
        assert_eq!(report.already_present, 30);
        assert_eq!(report.inserted, 45);
        assert_eq!(report.batches, 5);
        assert_eq!(store.len(), 75);

        // resuming an already complete catalog inserts nothing
        let mut cfg = config(50, 10);
        cfg.resume = true;
        let report = CatalogGenerator::new(cfg).unwrap().run(&mut store).unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(store.len(), 75);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = CatalogStore::new(LinearIndex::new());
        let mut b = CatalogStore::new(LinearIndex::new());
        CatalogGenerator::new(config(100, 33)).unwrap().run(&mut a).unwrap();
        CatalogGenerator::new(config(100, 7)).unwrap().run(&mut b).unwrap();
        assert_eq!(all(&a), all(&b));
    }

    #[test]
    fn invalid_configs_rejected_eagerly() {
        let mut cfg = config(10, 0);
        assert!(matches!(
            CatalogGenerator::new(cfg.clone()),
            Err(Error::Configuration { .. })
        ));
        cfg.batch_size = 10;
        cfg.dec_cap = Some((Angle::from_degrees(-10.0), Angle::from_degrees(10.0)));
        assert!(CatalogGenerator::new(cfg.clone()).is_err());
        cfg.dec_cap = None;
        cfg.mag_max = -1.0;
        assert!(CatalogGenerator::new(cfg).is_err());
    }

    #[test]
    fn zero_total_is_a_no_op() {
        let mut store = CatalogStore::new(LinearIndex::new());
        let report = CatalogGenerator::new(config(0, 10))
            .unwrap()
            .run(&mut store)
            .unwrap();
        assert_eq!(report.batches, 0);
        assert!(store.is_empty());
    }
}
