//! Uniform bucket grid over the `[-1, 1]³` cube.
//!
//! Each axis is cut into `cells_per_axis` equal slabs. An entry is listed in
//! every cell its box overlaps (exactly one cell for a point star). A query
//! visits only the cells its box overlaps, so a 5′ cone touches a handful of
//! cells out of 32 768 with the default resolution.
//!
//! Extended entries appear in several cells. They are reported once, from the
//! lowest cell shared by the entry and the query on each axis.

use super::{check_batch, CatalogEntry, SpatialIndex};
use skybox_core::{Bounds, Error, Range, Result};

pub const DEFAULT_CELLS_PER_AXIS: usize = 32;

/// Upper bound on grid resolution (128³ ≈ 2.1M cells, all allocated up front).
pub const MAX_CELLS_PER_AXIS: usize = 128;

#[derive(Debug, Clone)]
pub struct GridIndex {
    cells_per_axis: usize,
    cells: Vec<Vec<usize>>,
    entries: Vec<CatalogEntry>,
    max_id: u64,
}

impl Default for GridIndex {
    fn default() -> Self {
        Self::empty(DEFAULT_CELLS_PER_AXIS)
    }
}

impl GridIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// [`Error::Configuration`] unless `1 ≤ cells_per_axis ≤ 128`.
    pub fn with_cells(cells_per_axis: usize) -> Result<Self> {
        if cells_per_axis == 0 || cells_per_axis > MAX_CELLS_PER_AXIS {
            return Err(Error::configuration(
                "cells_per_axis",
                format!(
                    "must be in 1..={}, got {}",
                    MAX_CELLS_PER_AXIS, cells_per_axis
                ),
            ));
        }
        Ok(Self::empty(cells_per_axis))
    }

    fn empty(cells_per_axis: usize) -> Self {
        Self {
            cells_per_axis,
            cells: vec![Vec::new(); cells_per_axis.pow(3)],
            entries: Vec::new(),
            max_id: 0,
        }
    }

    pub fn cells_per_axis(&self) -> usize {
        self.cells_per_axis
    }

    /// Number of cells holding at least one entry.
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    fn cell_coord(&self, v: f64) -> usize {
        let n = self.cells_per_axis as f64;
        let c = ((v + 1.0) * 0.5 * n).floor();
        // NaN and anything left of the cube fall into the first slab
        if c.is_nan() || c <= 0.0 {
            0
        } else if c >= n {
            self.cells_per_axis - 1
        } else {
            c as usize
        }
    }

    fn span(&self, r: &Range) -> (usize, usize) {
        (self.cell_coord(r.min), self.cell_coord(r.max))
    }

    #[inline]
    fn cell_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (ix * self.cells_per_axis + iy) * self.cells_per_axis + iz
    }
}

impl SpatialIndex for GridIndex {
    fn insert_batch(&mut self, entries: &[CatalogEntry]) -> Result<()> {
        let max_id = check_batch(entries, self.max_id)?;
        self.entries.reserve(entries.len());
        for entry in entries {
            let slot = self.entries.len();
            self.entries.push(*entry);
            let (x0, x1) = self.span(&entry.bounds.x);
            let (y0, y1) = self.span(&entry.bounds.y);
            let (z0, z1) = self.span(&entry.bounds.z);
            for ix in x0..=x1 {
                for iy in y0..=y1 {
                    for iz in z0..=z1 {
                        let cell = self.cell_index(ix, iy, iz);
                        self.cells[cell].push(slot);
                    }
                }
            }
        }
        self.max_id = max_id;
        Ok(())
    }

    fn range_query(&self, bounds: &Bounds) -> Result<Vec<CatalogEntry>> {
        if !bounds.is_well_formed() {
            return Ok(Vec::new());
        }
        let (qx0, qx1) = self.span(&bounds.x);
        let (qy0, qy1) = self.span(&bounds.y);
        let (qz0, qz1) = self.span(&bounds.z);

        let mut out = Vec::new();
        for ix in qx0..=qx1 {
            for iy in qy0..=qy1 {
                for iz in qz0..=qz1 {
                    for &slot in &self.cells[self.cell_index(ix, iy, iz)] {
                        let entry = &self.entries[slot];
                        if !entry.bounds.intersects(bounds) {
                            continue;
                        }
                        let home = (
                            self.cell_coord(entry.bounds.x.min).max(qx0),
                            self.cell_coord(entry.bounds.y.min).max(qy0),
                            self.cell_coord(entry.bounds.z.min).max(qz0),
                        );
                        if home == (ix, iy, iz) {
                            out.push(*entry);
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn max_id(&self) -> u64 {
        self.max_id
    }

    fn reset(&mut self) -> Result<()> {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.entries.clear();
        self.max_id = 0;
        Ok(())
    }
}
