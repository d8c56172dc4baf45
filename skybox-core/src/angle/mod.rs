//! Angles with explicit units.
//!
//! [`Angle`] stores radians internally and is only ever built through a
//! unit-bearing constructor, so a declination in degrees and a search radius
//! in arcminutes cannot be confused at a call site:
//!
//! ```
//! use skybox_core::Angle;
//!
//! let ra = Angle::from_hours(6.0);
//! let dec = Angle::from_degrees(-5.375);
//! let rho = Angle::from_arcminutes(5.0);
//!
//! assert!((ra.degrees() - 90.0).abs() < 1e-12);
//! assert!(rho.degrees() < dec.degrees().abs());
//! ```
//!
//! Parsing from strings (sexagesimal or decimal) lives in [`parse`].

mod normalize;
pub mod parse;

pub use normalize::wrap_0_2pi;
pub use parse::{parse_dms, parse_hms, AngleUnits};

use crate::constants::{DEG_TO_RAD, RAD_TO_DEG};
use core::ops::{Add, Div, Mul, Neg, Sub};
use std::fmt;

/// An angle, stored in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle {
    rad: f64,
}

impl Angle {
    pub const ZERO: Angle = Angle { rad: 0.0 };

    #[inline]
    pub const fn from_radians(rad: f64) -> Self {
        Self { rad }
    }

    #[inline]
    pub fn from_degrees(deg: f64) -> Self {
        Self {
            rad: deg * DEG_TO_RAD,
        }
    }

    /// One hour of right ascension is 15 degrees.
    #[inline]
    pub fn from_hours(hours: f64) -> Self {
        Self::from_degrees(hours * 15.0)
    }

    #[inline]
    pub fn from_arcminutes(arcmin: f64) -> Self {
        Self::from_degrees(arcmin / 60.0)
    }

    #[inline]
    pub fn from_arcseconds(arcsec: f64) -> Self {
        Self::from_degrees(arcsec / 3600.0)
    }

    #[inline]
    pub fn radians(self) -> f64 {
        self.rad
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.rad * RAD_TO_DEG
    }

    #[inline]
    pub fn hours(self) -> f64 {
        self.degrees() / 15.0
    }

    #[inline]
    pub fn arcminutes(self) -> f64 {
        self.degrees() * 60.0
    }

    #[inline]
    pub fn arcseconds(self) -> f64 {
        self.degrees() * 3600.0
    }

    #[inline]
    pub fn sin(self) -> f64 {
        libm::sin(self.rad)
    }

    #[inline]
    pub fn cos(self) -> f64 {
        libm::cos(self.rad)
    }

    #[inline]
    pub fn sin_cos(self) -> (f64, f64) {
        libm::sincos(self.rad)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.rad.is_finite()
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self::from_radians(self.rad.abs())
    }

    /// Same direction, wrapped to [0, 2π).
    #[inline]
    pub fn wrapped(self) -> Self {
        Self::from_radians(wrap_0_2pi(self.rad))
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}°", p, self.degrees()),
            None => write!(f, "{}°", self.degrees()),
        }
    }
}

impl Add for Angle {
    type Output = Angle;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Angle::from_radians(self.rad + rhs.rad)
    }
}

impl Sub for Angle {
    type Output = Angle;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Angle::from_radians(self.rad - rhs.rad)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;
    #[inline]
    fn mul(self, k: f64) -> Self {
        Angle::from_radians(self.rad * k)
    }
}

impl Div<f64> for Angle {
    type Output = Angle;
    #[inline]
    fn div(self, k: f64) -> Self {
        Angle::from_radians(self.rad / k)
    }
}

impl Neg for Angle {
    type Output = Angle;
    #[inline]
    fn neg(self) -> Self {
        Angle::from_radians(-self.rad)
    }
}
