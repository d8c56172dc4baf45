//! Cone queries: "what is within ρ of this direction, no fainter than m".
//!
//! [`QueryEngine`] turns each query into a [`SearchBox`] and hands its bounds
//! to [`CatalogStore::range_query`]. The result is the box result: objects in
//! the cube corners beyond ρ are included, and with the default
//! [`HalfWidth::Sine`] policy objects right at the cap rim may be missed for
//! some orientations (see [`skybox_core::search_box`]). Callers wanting an
//! exact cut-off filter on [`MatchRecord::separation`].
//!
//! Batch queries run on the rayon pool and return one `Result` per input in
//! input order, so a bad tuple never voids the rest of the batch.

use crate::index::{CatalogEntry, SpatialIndex};
use crate::store::CatalogStore;
use log::debug;
use rayon::prelude::*;
use skybox_core::search_box::{self, HalfWidth, SearchBox};
use skybox_core::{angular_separation, to_spherical, Angle, Result, SkyDirection, Vector3};

/// One cone query with explicit angular units.
///
/// The center is validated when the query runs, so a batch can carry bad
/// tuples and report them individually.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConeQuery {
    pub ra: Angle,
    pub dec: Angle,
    pub radius: Angle,
    /// Faintest magnitude to return (inclusive).
    pub mag_limit: f64,
}

impl ConeQuery {
    pub fn new(ra: Angle, dec: Angle, radius: Angle, mag_limit: f64) -> Self {
        Self {
            ra,
            dec,
            radius,
            mag_limit,
        }
    }

    pub fn at(center: &SkyDirection, radius: Angle, mag_limit: f64) -> Self {
        Self::new(center.ra(), center.dec(), radius, mag_limit)
    }

    /// # Errors
    /// [`Error::Domain`](skybox_core::Error::Domain) for non-finite angles or
    /// |dec| > 90°.
    pub fn center(&self) -> Result<SkyDirection> {
        SkyDirection::new(self.ra, self.dec)
    }
}

/// Entries matched by one query, with the box that selected them.
#[derive(Debug, Clone)]
pub struct QueryMatches {
    pub search_box: SearchBox,
    pub entries: Vec<CatalogEntry>,
}

impl QueryMatches {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-entry sky position and separation from the query center, closest
    /// first.
    pub fn records(&self) -> Result<Vec<MatchRecord>> {
        let mut out = self
            .entries
            .iter()
            .map(|e| MatchRecord::new(e, &self.search_box.center))
            .collect::<Result<Vec<_>>>()?;
        out.sort_by(|a, b| a.separation.radians().total_cmp(&b.separation.radians()));
        Ok(out)
    }
}

/// A matched entry in sky coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRecord {
    pub id: u64,
    pub ra: Angle,
    pub dec: Angle,
    pub magnitude: f64,
    /// Great-circle distance from the query center.
    pub separation: Angle,
}

impl MatchRecord {
    fn new(entry: &CatalogEntry, center: &Vector3) -> Result<Self> {
        let position = entry.position();
        let (ra, dec) = to_spherical(&position)?;
        Ok(Self {
            id: entry.id,
            ra,
            dec,
            magnitude: entry.magnitude(),
            separation: angular_separation(center, &position)?,
        })
    }
}

/// Read-only query front end over a [`CatalogStore`].
pub struct QueryEngine<'a, I: SpatialIndex> {
    store: &'a CatalogStore<I>,
    half_width: HalfWidth,
}

impl<'a, I: SpatialIndex> QueryEngine<'a, I> {
    pub fn new(store: &'a CatalogStore<I>) -> Self {
        Self {
            store,
            half_width: HalfWidth::default(),
        }
    }

    /// Use a different box half-width policy, e.g. [`HalfWidth::Chord`] for
    /// a box guaranteed to contain the whole cap.
    pub fn with_half_width(mut self, policy: HalfWidth) -> Self {
        self.half_width = policy;
        self
    }

    pub fn half_width(&self) -> HalfWidth {
        self.half_width
    }

    pub fn nearest(&self, query: &ConeQuery) -> Result<QueryMatches> {
        let center = query.center()?;
        self.nearest_direction(&center.to_unit_vector(), query.radius, query.mag_limit)
    }

    /// Query around a Cartesian direction (normalized if needed).
    pub fn nearest_direction(
        &self,
        direction: &Vector3,
        radius: Angle,
        mag_limit: f64,
    ) -> Result<QueryMatches> {
        let sb = search_box::build_with(direction, radius, mag_limit, self.half_width)?;
        let entries = self.store.range_query(&sb.bounds(), mag_limit)?;
        debug!("Query {} -> {} entries", sb, entries.len());
        Ok(QueryMatches {
            search_box: sb,
            entries,
        })
    }

    pub fn count(&self, query: &ConeQuery) -> Result<usize> {
        self.nearest(query).map(|m| m.len())
    }

    /// One result per query, in input order. Runs in parallel.
    pub fn nearest_batch(&self, queries: &[ConeQuery]) -> Vec<Result<QueryMatches>> {
        queries.par_iter().map(|q| self.nearest(q)).collect()
    }

    pub fn count_batch(&self, queries: &[ConeQuery]) -> Vec<Result<usize>> {
        queries.par_iter().map(|q| self.count(q)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{GridIndex, LinearIndex};
    use skybox_core::{to_cartesian, Error};

    fn deg(v: f64) -> Angle {
        Angle::from_degrees(v)
    }

    fn store_with(points: &[(f64, f64, f64)]) -> CatalogStore<GridIndex> {
        let mut store = CatalogStore::new(GridIndex::new());
        for &(ra, dec, mag) in points {
            store.insert(&to_cartesian(deg(ra), deg(dec)), mag).unwrap();
        }
        store
    }

    #[test]
    fn finds_point_near_center_across_ra_wrap() {
        let store = store_with(&[(359.99, 0.0, 5.0), (0.01, 0.0, 6.0), (180.0, 0.0, 5.0)]);
        let engine = QueryEngine::new(&store);
        let q = ConeQuery::new(deg(0.0), deg(0.0), Angle::from_arcminutes(5.0), 14.0);
        let m = engine.nearest(&q).unwrap();
        let mut ids: Vec<u64> = m.entries.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn pole_query_catches_all_ra() {
        let store = store_with(&[(0.0, 89.9, 1.0), (90.0, 89.9, 1.0), (200.0, 89.9, 1.0), (0.0, 80.0, 1.0)]);
        let engine = QueryEngine::new(&store);
        let q = ConeQuery::new(deg(0.0), deg(90.0), deg(0.5), 14.0);
        assert_eq!(engine.count(&q).unwrap(), 3);
    }

    #[test]
    fn magnitude_limit_applies() {
        let store = store_with(&[(10.0, 10.0, 8.0), (10.0, 10.0, 15.0)]);
        let engine = QueryEngine::new(&store);
        let c = SkyDirection::from_degrees(10.0, 10.0).unwrap();
        assert_eq!(engine.count(&ConeQuery::at(&c, deg(0.1), 14.0)).unwrap(), 1);
        assert_eq!(engine.count(&ConeQuery::at(&c, deg(0.1), 15.0)).unwrap(), 2);
    }

    #[test]
    fn zero_radius_finds_exact_point() {
        let store = store_with(&[(42.0, -17.0, 3.0), (42.0, -17.001, 3.0)]);
        let engine = QueryEngine::new(&store);
        let v = to_cartesian(deg(42.0), deg(-17.0));
        let m = engine.nearest_direction(&v, Angle::ZERO, 14.0).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.entries[0].id, 1);
    }

    #[test]
    fn chord_policy_is_wider() {
        let store = store_with(&[(0.0, 0.0, 1.0)]);
        let sine = QueryEngine::new(&store);
        let chord = QueryEngine::new(&store).with_half_width(HalfWidth::Chord);
        let q = ConeQuery::new(deg(0.0), deg(0.0), deg(30.0), 14.0);
        let a = sine.nearest(&q).unwrap().search_box.half_width;
        let b = chord.nearest(&q).unwrap().search_box.half_width;
        assert!(b > a);
        assert!(sine.nearest(&ConeQuery::new(deg(0.0), deg(0.0), deg(120.0), 14.0)).is_err());
        assert!(chord.nearest(&ConeQuery::new(deg(0.0), deg(0.0), deg(120.0), 14.0)).is_ok());
    }

    #[test]
    fn records_are_sorted_by_separation() {
        let store = store_with(&[(10.3, 0.0, 1.0), (10.1, 0.0, 2.0), (10.2, 0.0, 3.0)]);
        let engine = QueryEngine::new(&store);
        let q = ConeQuery::new(deg(10.0), deg(0.0), deg(1.0), 14.0);
        let recs = engine.nearest(&q).unwrap().records().unwrap();
        let ids: Vec<u64> = recs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!((recs[0].separation.degrees() - 0.1).abs() < 1e-6);
        assert!((recs[0].ra.degrees() - 10.1).abs() < 1e-9);
    }

    #[test]
    fn batch_preserves_order_and_isolates_errors() {
        let store = store_with(&[(0.0, 0.0, 1.0), (90.0, 0.0, 1.0), (90.0, 0.1, 1.0)]);
        let engine = QueryEngine::new(&store);
        let rho = deg(0.5);
        let queries = vec![
            ConeQuery::new(deg(90.0), deg(0.0), rho, 14.0),
            ConeQuery::new(deg(0.0), deg(95.0), rho, 14.0),
            ConeQuery::new(deg(0.0), deg(0.0), rho, 14.0),
            ConeQuery::new(deg(0.0), deg(0.0), deg(-1.0), 14.0),
            ConeQuery::new(deg(270.0), deg(0.0), rho, 14.0),
        ];
        let counts = engine.count_batch(&queries);
        assert_eq!(counts.len(), 5);
        assert_eq!(*counts[0].as_ref().unwrap(), 2);
        assert!(matches!(counts[1], Err(Error::Domain { .. })));
        assert_eq!(*counts[2].as_ref().unwrap(), 1);
        assert!(matches!(counts[3], Err(Error::Configuration { .. })));
        assert_eq!(*counts[4].as_ref().unwrap(), 0);

        let matches = engine.nearest_batch(&queries);
        assert_eq!(matches[0].as_ref().unwrap().len(), 2);
        assert!(matches[1].is_err());
    }

    #[test]
    fn batch_matches_sequential_on_larger_catalog() {
        let mut store = CatalogStore::new(LinearIndex::new());
        for i in 0..2_000 {
            let ra = (i as f64 * 7.3) % 360.0;
            let dec = ((i as f64 * 3.1) % 180.0) - 90.0;
            store.insert(&to_cartesian(deg(ra), deg(dec)), (i % 14) as f64).unwrap();
        }
        let engine = QueryEngine::new(&store);
        let queries: Vec<ConeQuery> = (0..64)
            .map(|k| ConeQuery::new(deg(k as f64 * 5.0), deg(k as f64 - 32.0), deg(3.0), 10.0))
            .collect();
        let batch = engine.count_batch(&queries);
        for (q, got) in queries.iter().zip(batch) {
            assert_eq!(got.unwrap(), engine.count(q).unwrap());
        }
    }
}
