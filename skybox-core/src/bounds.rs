//! Axis-aligned bounds over the catalog's four indexed axes.
//!
//! Every catalog entry and every query is a box in (x, y, z, m) space: three
//! Cartesian axes of the unit-sphere embedding plus apparent magnitude. A
//! point star is a degenerate box with `min == max` on each axis.

use crate::vector::Vector3;
use std::fmt;

/// A closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    #[inline]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub const fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// `[-∞, +∞]`, matches everything.
    #[inline]
    pub const fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    #[inline]
    pub fn is_point(&self) -> bool {
        self.min == self.max
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Closed-interval overlap test.
    #[inline]
    pub fn intersects(&self, other: &Range) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// A box over (x, y, z, magnitude).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub x: Range,
    pub y: Range,
    pub z: Range,
    pub m: Range,
}

impl Bounds {
    /// Degenerate box for a point object.
    pub fn point(position: &Vector3, magnitude: f64) -> Self {
        Self {
            x: Range::point(position.x),
            y: Range::point(position.y),
            z: Range::point(position.z),
            m: Range::point(magnitude),
        }
    }

    /// Cube of half-width `half_width` around `center`, with an explicit
    /// magnitude range.
    pub fn cube(center: &Vector3, half_width: f64, m: Range) -> Self {
        Self {
            x: Range::new(center.x - half_width, center.x + half_width),
            y: Range::new(center.y - half_width, center.y + half_width),
            z: Range::new(center.z - half_width, center.z + half_width),
            m,
        }
    }

    /// Matches every entry.
    pub const fn unbounded() -> Self {
        Self {
            x: Range::unbounded(),
            y: Range::unbounded(),
            z: Range::unbounded(),
            m: Range::unbounded(),
        }
    }

    #[inline]
    pub fn axes(&self) -> [Range; 4] {
        [self.x, self.y, self.z, self.m]
    }

    #[inline]
    pub fn is_point(&self) -> bool {
        self.axes().iter().all(Range::is_point)
    }

    /// Closed-interval intersection on all four axes.
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x.intersects(&other.x)
            && self.y.intersects(&other.y)
            && self.z.intersects(&other.z)
            && self.m.intersects(&other.m)
    }

    /// Center of the spatial part. For point entries this is the stored position.
    #[inline]
    pub fn center(&self) -> Vector3 {
        Vector3::new(
            0.5 * (self.x.min + self.x.max),
            0.5 * (self.y.min + self.y.max),
            0.5 * (self.z.min + self.z.max),
        )
    }

    /// Magnitude of a point entry (midpoint of the m range in general).
    #[inline]
    pub fn magnitude(&self) -> f64 {
        0.5 * (self.m.min + self.m.max)
    }

    pub fn is_finite(&self) -> bool {
        self.axes()
            .iter()
            .all(|r| r.min.is_finite() && r.max.is_finite())
    }

    /// All mins ≤ maxes, no NaN.
    pub fn is_well_formed(&self) -> bool {
        self.axes().iter().all(|r| r.min <= r.max)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x[{:.6}, {:.6}] y[{:.6}, {:.6}] z[{:.6}, {:.6}] m[{}, {}]",
            self.x.min, self.x.max, self.y.min, self.y.max, self.z.min, self.z.max, self.m.min,
            self.m.max
        )
    }
}
