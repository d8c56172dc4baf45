//! Angular cone query → axis-aligned Cartesian box.
//!
//! A cap of angular radius ρ around a unit vector `c` sits inside the cube
//! `[c - d, c + d]³` for a suitable half-width `d`. Turning the angular
//! predicate into three independent linear ranges lets any box-capable index
//! answer cone queries with no RA wraparound and no polar distortion.
//!
//! Two half-width policies are offered:
//!
//! | Policy | `d` | Valid ρ | Containment |
//! |--------|-----|---------|-------------|
//! | [`HalfWidth::Sine`] | `sin ρ` | [0, π/2] | exact as ρ → 0; may miss the cap rim by up to `2·sin(ρ/2) − sin ρ` |
//! | [`HalfWidth::Chord`] | `2·sin(ρ/2)` | [0, π] | always a superset of the cap |
//!
//! Both over-include the cube corners relative to the true cap. Callers that
//! need an exact cut-off filter the returned candidates with
//! [`angular_separation`](crate::angular_separation).

use crate::angle::Angle;
use crate::bounds::{Bounds, Range};
use crate::constants::{HALF_PI, PI};
use crate::vector::Vector3;
use crate::{Error, Result};
use std::fmt;

/// How the cube half-width is derived from the angular radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HalfWidth {
    /// `d = sin ρ`.
    #[default]
    Sine,
    /// `d = 2·sin(ρ/2)`, the chord length subtended by ρ.
    Chord,
}

impl HalfWidth {
    pub fn max_radius(self) -> Angle {
        match self {
            HalfWidth::Sine => Angle::from_radians(HALF_PI),
            HalfWidth::Chord => Angle::from_radians(PI),
        }
    }

    pub fn half_width(self, radius: Angle) -> f64 {
        match self {
            HalfWidth::Sine => radius.sin(),
            HalfWidth::Chord => 2.0 * (radius / 2.0).sin(),
        }
    }
}

/// An ephemeral query box: center direction, half-width and magnitude ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBox {
    pub center: Vector3,
    pub half_width: f64,
    pub mag_limit: f64,
}

impl SearchBox {
    /// Query bounds: the spatial cube plus `m ∈ [-∞, mag_limit]`.
    pub fn bounds(&self) -> Bounds {
        Bounds::cube(
            &self.center,
            self.half_width,
            Range::new(f64::NEG_INFINITY, self.mag_limit),
        )
    }

    /// Spatial containment only; magnitude is not considered.
    pub fn contains(&self, point: &Vector3) -> bool {
        self.center.max_abs_diff(point) <= self.half_width
    }
}

impl fmt::Display for SearchBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "center {} ± {:.6e}, m ≤ {}",
            self.center, self.half_width, self.mag_limit
        )
    }
}

/// Build a search box using the default [`HalfWidth::Sine`] policy.
pub fn build(direction: &Vector3, radius: Angle, mag_limit: f64) -> Result<SearchBox> {
    build_with(direction, radius, mag_limit, HalfWidth::Sine)
}

/// Build a search box with an explicit half-width policy.
///
/// Non-unit directions are normalized first, so callers may pass any
/// non-zero vector.
///
/// # Errors
/// - [`Error::Configuration`] when ρ is not finite, negative, or above the
///   policy's maximum, or when `mag_limit` is NaN.
/// - [`Error::Domain`] when the direction is zero-length or not finite.
pub fn build_with(
    direction: &Vector3,
    radius: Angle,
    mag_limit: f64,
    policy: HalfWidth,
) -> Result<SearchBox> {
    let max = policy.max_radius();
    if !radius.is_finite() || radius.radians() < 0.0 || radius.radians() > max.radians() {
        return Err(Error::configuration(
            "radius",
            format!(
                "angular radius {} outside [0°, {}] for {:?} half-width",
                radius, max, policy
            ),
        ));
    }
    if mag_limit.is_nan() {
        return Err(Error::configuration("mag_limit", "magnitude ceiling is NaN"));
    }

    // unit inputs pass through untouched so a stored point queried with its
    // own direction lands exactly on the box center
    let center = if direction.is_finite() && direction.is_unit() {
        *direction
    } else {
        direction.normalize()?
    };

    Ok(SearchBox {
        center,
        half_width: policy.half_width(radius),
        mag_limit,
    })
}
