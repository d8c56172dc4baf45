//! Random sky positions, uniform per unit solid angle.
//!
//! Drawing declination uniformly in angle oversamples the poles: the area of
//! a declination band shrinks as `cos(dec)`. [`SphereSampler`] instead
//! inverts the CDF of the area element `cos(δ) dδ` restricted to a cap
//! `|δ| ∈ [a0, a1]`:
//!
//! ```text
//! |δ| = asin((1 - u)·sin(a0) + u·sin(a1)),   u ~ U[0, 1)
//! ```
//!
//! which is the same as drawing `cos(colatitude)` linearly. The sign of δ is
//! then chosen independently with equal probability, RA is uniform on
//! [0, 2π), and magnitude is uniform on [0, mag_max).
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use skybox_core::{Angle, DecCap, SphereSampler};
//!
//! let cap = DecCap::new(Angle::from_degrees(60.0), Angle::from_degrees(90.0)).unwrap();
//! let mut sampler = SphereSampler::new(ChaCha8Rng::seed_from_u64(1), cap, 14.0).unwrap();
//! let s = sampler.sample();
//! assert!(s.dec.degrees().abs() >= 60.0);
//! assert!(s.direction().is_unit());
//! ```

use crate::angle::Angle;
use crate::constants::{HALF_PI, TWOPI};
use crate::transform::to_cartesian;
use crate::vector::Vector3;
use crate::{Error, Result};
use rand::Rng;

/// Bounds on |declination| for sampling. Both bounds are measured from the
/// equator and apply symmetrically to both hemispheres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecCap {
    min: Angle,
    max: Angle,
}

impl DecCap {
    /// # Errors
    /// [`Error::Configuration`] unless `0 ≤ min ≤ max ≤ 90°`. Negative lower
    /// bounds are a known restriction of the cap parameterization and are
    /// rejected rather than reinterpreted.
    pub fn new(min: Angle, max: Angle) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::configuration("dec_cap", "bounds must be finite"));
        }
        if min.radians() < 0.0 {
            return Err(Error::configuration(
                "dec_cap",
                format!("lower bound must be >= 0°, got {:.6}", min),
            ));
        }
        if max.radians() > HALF_PI {
            return Err(Error::configuration(
                "dec_cap",
                format!("upper bound must be <= 90°, got {:.6}", max),
            ));
        }
        if min.radians() > max.radians() {
            return Err(Error::configuration(
                "dec_cap",
                format!("lower bound {:.6} exceeds upper bound {:.6}", min, max),
            ));
        }
        Ok(Self { min, max })
    }

    /// The whole sphere: |dec| ∈ [0°, 90°].
    pub fn full_sphere() -> Self {
        Self {
            min: Angle::ZERO,
            max: Angle::from_radians(HALF_PI),
        }
    }

    pub fn min(&self) -> Angle {
        self.min
    }

    pub fn max(&self) -> Angle {
        self.max
    }

    /// Fraction of the full sphere covered by both hemispheres of the cap.
    pub fn sky_fraction(&self) -> f64 {
        self.max.sin() - self.min.sin()
    }
}

impl Default for DecCap {
    fn default() -> Self {
        Self::full_sphere()
    }
}

/// One sampled catalog object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkySample {
    pub ra: Angle,
    pub dec: Angle,
    pub magnitude: f64,
}

impl SkySample {
    /// Unit vector through [`to_cartesian`].
    pub fn direction(&self) -> Vector3 {
        to_cartesian(self.ra, self.dec)
    }
}

/// Generator of sky positions and magnitudes.
pub struct SphereSampler<R: Rng> {
    rng: R,
    cap: DecCap,
    sin_min: f64,
    sin_max: f64,
    mag_max: f64,
}

impl<R: Rng> SphereSampler<R> {
    /// # Errors
    /// [`Error::Configuration`] if `mag_max` is not finite and positive.
    pub fn new(rng: R, cap: DecCap, mag_max: f64) -> Result<Self> {
        if !mag_max.is_finite() || mag_max <= 0.0 {
            return Err(Error::configuration(
                "mag_max",
                format!("must be finite and > 0, got {}", mag_max),
            ));
        }
        Ok(Self {
            rng,
            cap,
            sin_min: cap.min.sin(),
            sin_max: cap.max.sin(),
            mag_max,
        })
    }

    pub fn cap(&self) -> DecCap {
        self.cap
    }

    pub fn mag_max(&self) -> f64 {
        self.mag_max
    }

    /// |dec| drawn with density ∝ cos(dec) on the cap.
    pub fn sample_abs_dec(&mut self) -> Angle {
        let u: f64 = self.rng.gen();
        let s = (1.0 - u) * self.sin_min + u * self.sin_max;
        // guarded against rounding past 1 before asin
        Angle::from_radians(libm::asin(s.clamp(0.0, 1.0)))
    }

    pub fn sample_sign(&mut self) -> f64 {
        if self.rng.gen_bool(0.5) {
            1.0
        } else {
            -1.0
        }
    }

    pub fn sample_ra(&mut self) -> Angle {
        Angle::from_radians(self.rng.gen_range(0.0..TWOPI))
    }

    pub fn sample_magnitude(&mut self) -> f64 {
        self.rng.gen_range(0.0..self.mag_max)
    }

    pub fn sample(&mut self) -> SkySample {
        let ra = self.sample_ra();
        let dec = self.sample_abs_dec() * self.sample_sign();
        let magnitude = self.sample_magnitude();
        SkySample { ra, dec, magnitude }
    }

    /// `n` independent samples.
    pub fn sample_n(&mut self, n: usize) -> Vec<SkySample> {
        (0..n).map(|_| self.sample()).collect()
    }
}

impl<R: Rng> Iterator for SphereSampler<R> {
    type Item = SkySample;

    fn next(&mut self) -> Option<SkySample> {
        Some(self.sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sampler(seed: u64, cap: DecCap) -> SphereSampler<ChaCha8Rng> {
        SphereSampler::new(ChaCha8Rng::seed_from_u64(seed), cap, 14.0).unwrap()
    }

    fn chi_square(counts: &[usize], expected: f64) -> f64 {
        counts
            .iter()
            .map(|&c| {
                let d = c as f64 - expected;
                d * d / expected
            })
            .sum()
    }

    #[test]
    fn all_samples_on_unit_sphere() {
        let mut s = sampler(1, DecCap::full_sphere());
        for sample in s.sample_n(20_000) {
            let v = sample.direction();
            assert!((v.magnitude_squared() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn magnitudes_and_ra_in_range() {
        let mut s = sampler(2, DecCap::full_sphere());
        for sample in s.sample_n(10_000) {
            assert!((0.0..14.0).contains(&sample.magnitude));
            assert!((0.0..TWOPI).contains(&sample.ra.radians()));
        }
    }

    #[test]
    fn cap_bounds_respected() {
        let cap = DecCap::new(Angle::from_degrees(30.0), Angle::from_degrees(60.0)).unwrap();
        let mut s = sampler(3, cap);
        let mut north = 0usize;
        for sample in s.sample_n(10_000) {
            let d = sample.dec.degrees();
            assert!(
                (30.0 - 1e-9..=60.0 + 1e-9).contains(&d.abs()),
                "|dec| {} outside cap",
                d
            );
            if d > 0.0 {
                north += 1;
            }
        }
        // sign is a fair coin: 5000 ± 4σ (σ = 50)
        assert!((4800..=5200).contains(&north), "north count {}", north);
    }

    #[test]
    fn full_sphere_density_uniform_per_solid_angle() {
        // equal-width bins in sin(dec) are equal-area bands
        const BINS: usize = 20;
        const N: usize = 40_000;
        let mut s = sampler(4, DecCap::full_sphere());
        let mut counts = [0usize; BINS];
        for sample in s.sample_n(N) {
            let z = sample.dec.sin();
            let bin = (((z + 1.0) / 2.0) * BINS as f64) as usize;
            counts[bin.min(BINS - 1)] += 1;
        }
        let chi2 = chi_square(&counts, N as f64 / BINS as f64);
        // 19 degrees of freedom, p = 0.001 critical value ≈ 43.8
        assert!(chi2 < 43.8, "chi-square {} counts {:?}", chi2, counts);
    }

    #[test]
    fn cap_density_uniform_per_solid_angle() {
        const BINS: usize = 10;
        const N: usize = 20_000;
        let cap = DecCap::new(Angle::from_degrees(20.0), Angle::from_degrees(70.0)).unwrap();
        let (lo, hi) = (cap.min().sin(), cap.max().sin());
        let mut s = sampler(5, cap);
        let mut counts = [0usize; BINS];
        for sample in s.sample_n(N) {
            let z = sample.dec.abs().sin();
            let bin = (((z - lo) / (hi - lo)) * BINS as f64) as usize;
            counts[bin.min(BINS - 1)] += 1;
        }
        let chi2 = chi_square(&counts, N as f64 / BINS as f64);
        // 9 degrees of freedom, p = 0.001 critical value ≈ 27.9
        assert!(chi2 < 27.9, "chi-square {} counts {:?}", chi2, counts);
    }

    #[test]
    fn uniform_in_angle_would_fail_the_same_test() {
        // sanity check that the chi-square test discriminates
        const BINS: usize = 20;
        const N: usize = 40_000;
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut counts = [0usize; BINS];
        for _ in 0..N {
            let dec: f64 = rng.gen_range(-HALF_PI..HALF_PI);
            let bin = (((libm::sin(dec) + 1.0) / 2.0) * BINS as f64) as usize;
            counts[bin.min(BINS - 1)] += 1;
        }
        assert!(chi_square(&counts, N as f64 / BINS as f64) > 43.8);
    }

    #[test]
    fn degenerate_cap_pins_declination() {
        let a = Angle::from_degrees(45.0);
        let cap = DecCap::new(a, a).unwrap();
        let mut s = sampler(7, cap);
        for sample in s.sample_n(100) {
            assert!((sample.dec.degrees().abs() - 45.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cap_validation() {
        let d = Angle::from_degrees;
        assert!(matches!(
            DecCap::new(d(-1.0), d(30.0)),
            Err(Error::Configuration { .. })
        ));
        assert!(DecCap::new(d(10.0), d(91.0)).is_err());
        assert!(DecCap::new(d(40.0), d(30.0)).is_err());
        assert!(DecCap::new(Angle::from_radians(f64::NAN), d(30.0)).is_err());
        assert!(DecCap::new(d(0.0), d(90.0)).is_ok());
        assert!((DecCap::full_sphere().sky_fraction() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn mag_max_validation() {
        let rng = ChaCha8Rng::seed_from_u64(0);
        assert!(SphereSampler::new(rng.clone(), DecCap::full_sphere(), 0.0).is_err());
        assert!(SphereSampler::new(rng.clone(), DecCap::full_sphere(), f64::NAN).is_err());
        assert!(SphereSampler::new(rng, DecCap::full_sphere(), 14.0).is_ok());
    }

    #[test]
    fn seeded_samplers_are_reproducible() {
        let a = sampler(99, DecCap::full_sphere()).sample_n(50);
        let b = sampler(99, DecCap::full_sphere()).sample_n(50);
        assert_eq!(a, b);
    }
}
