//! Spherical ↔ Cartesian mapping.
//!
//! [`to_cartesian`] is the only definition of the sky-to-vector embedding in
//! the workspace. The generator calls it to build stored points and the query
//! engine calls it to build search-box centers, so both sides of the catalog
//! always agree on where a direction lands.
//!
//! ```
//! use skybox_core::{to_cartesian, to_spherical, Angle};
//!
//! let v = to_cartesian(Angle::from_degrees(90.0), Angle::from_degrees(0.0));
//! assert!((v.y - 1.0).abs() < 1e-15);
//!
//! let (ra, dec) = to_spherical(&v).unwrap();
//! assert!((ra.degrees() - 90.0).abs() < 1e-12);
//! assert!(dec.degrees().abs() < 1e-12);
//! ```

use crate::angle::{wrap_0_2pi, Angle};
use crate::constants::HALF_PI;
use crate::vector::Vector3;
use crate::{Error, Result};
use std::fmt;

/// Unit vector for a right ascension / declination pair.
///
/// `x = cos(dec)·cos(ra)`, `y = cos(dec)·sin(ra)`, `z = sin(dec)`.
#[inline]
pub fn to_cartesian(ra: Angle, dec: Angle) -> Vector3 {
    let (sin_ra, cos_ra) = ra.sin_cos();
    let (sin_dec, cos_dec) = dec.sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Right ascension in [0, 2π) and declination in [-π/2, π/2] of a vector.
///
/// The vector need not be normalized. At the poles RA is reported as 0.
///
/// # Errors
/// [`Error::Domain`] for zero-length or non-finite vectors.
pub fn to_spherical(v: &Vector3) -> Result<(Angle, Angle)> {
    let unit = v.normalize()?;

    let rho2 = unit.x * unit.x + unit.y * unit.y;
    let ra = if rho2 == 0.0 {
        0.0
    } else {
        wrap_0_2pi(libm::atan2(unit.y, unit.x))
    };
    // |z| can exceed 1 by an ulp after normalization
    let dec = libm::asin(unit.z.clamp(-1.0, 1.0));

    Ok((Angle::from_radians(ra), Angle::from_radians(dec)))
}

/// Great-circle separation of two directions.
///
/// Uses `acos` of the clamped dot product of the normalized inputs. The
/// catalog never applies this itself; it is here for callers that want an
/// exact cut-off on top of the conservative box query.
pub fn angular_separation(a: &Vector3, b: &Vector3) -> Result<Angle> {
    let a = a.normalize()?;
    let b = b.normalize()?;
    let cos = a.dot(&b).clamp(-1.0, 1.0);
    Ok(Angle::from_radians(libm::acos(cos)))
}

/// A validated sky position.
///
/// RA is wrapped to [0, 2π); declination must lie in [-90°, +90°].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkyDirection {
    ra: Angle,
    dec: Angle,
}

impl SkyDirection {
    /// # Errors
    /// [`Error::Domain`] if either angle is not finite or |dec| > 90°.
    pub fn new(ra: Angle, dec: Angle) -> Result<Self> {
        if !ra.is_finite() {
            return Err(Error::domain("SkyDirection::new", "RA not finite"));
        }
        if !dec.is_finite() {
            return Err(Error::domain("SkyDirection::new", "Dec not finite"));
        }
        if !(-HALF_PI..=HALF_PI).contains(&dec.radians()) {
            return Err(Error::domain(
                "SkyDirection::new",
                format!("Dec {:.6}° out of range [-90°, +90°]", dec.degrees()),
            ));
        }
        Ok(Self {
            ra: ra.wrapped(),
            dec,
        })
    }

    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Result<Self> {
        Self::new(Angle::from_degrees(ra_deg), Angle::from_degrees(dec_deg))
    }

    /// Recover the direction of a (not necessarily unit) vector.
    pub fn from_vector(v: &Vector3) -> Result<Self> {
        let (ra, dec) = to_spherical(v)?;
        Ok(Self { ra, dec })
    }

    pub fn ra(&self) -> Angle {
        self.ra
    }

    pub fn dec(&self) -> Angle {
        self.dec
    }

    pub fn to_unit_vector(&self) -> Vector3 {
        to_cartesian(self.ra, self.dec)
    }

    pub fn separation(&self, other: &SkyDirection) -> Angle {
        let cos = self
            .to_unit_vector()
            .dot(&other.to_unit_vector())
            .clamp(-1.0, 1.0);
        Angle::from_radians(libm::acos(cos))
    }
}

impl fmt::Display for SkyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RA={:.6}° Dec={:+.6}°",
            self.ra.degrees(),
            self.dec.degrees()
        )
    }
}
