//! 3D Cartesian vectors.
//!
//! Sky directions become unit vectors before they touch the catalog. On the
//! unit sphere the dot product of two directions is the cosine of their
//! separation, and a small cap around a direction fits inside a small
//! axis-aligned cube around the same vector, which is what makes the
//! catalog's box queries work without RA wraparound or polar special cases.

use crate::constants::UNIT_NORM_TOLERANCE;
use crate::{Error, Result};
use core::ops::{Add, Mul, Neg, Sub};
use std::fmt;

/// A 3D Cartesian vector. Components are public for direct access.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn x_axis() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn y_axis() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    #[inline]
    pub const fn z_axis() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    #[inline]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.magnitude_squared())
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// True when `|v|² = 1` within [`UNIT_NORM_TOLERANCE`].
    #[inline]
    pub fn is_unit(&self) -> bool {
        (self.magnitude_squared() - 1.0).abs() <= UNIT_NORM_TOLERANCE
    }

    /// Unit vector in the same direction.
    ///
    /// # Errors
    /// [`Error::Domain`] for zero-length or non-finite vectors.
    pub fn normalize(&self) -> Result<Self> {
        if !self.is_finite() {
            return Err(Error::domain(
                "normalize",
                format!("non-finite vector {}", self),
            ));
        }
        let mag = self.magnitude();
        if mag == 0.0 {
            return Err(Error::domain("normalize", "zero-length vector"));
        }
        Ok(Self::new(self.x / mag, self.y / mag, self.z / mag))
    }

    /// Largest absolute component difference (Chebyshev distance).
    #[inline]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn mul(self, k: f64) -> Self {
        Vector3::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    #[inline]
    fn neg(self) -> Self {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}
