//! Wrapping of cyclic angles.
//!
//! Right ascension lives in [0, 2π). [`wrap_0_2pi`] uses `libm::fmod` so
//! negative inputs land in range after a single correction.

use crate::constants::TWOPI;

/// Wraps an angle in radians to [0, 2π).
///
/// ```
/// use skybox_core::angle::wrap_0_2pi;
/// use std::f64::consts::PI;
///
/// let x = wrap_0_2pi(-PI / 2.0);
/// assert!((x - 3.0 * PI / 2.0).abs() < 1e-10);
/// ```
#[inline]
pub fn wrap_0_2pi(x: f64) -> f64 {
    let w = libm::fmod(x, TWOPI);
    if w < 0.0 {
        // -1e-17 + 2π rounds to 2π, which is outside the half-open range
        let shifted = w + TWOPI;
        if shifted >= TWOPI {
            0.0
        } else {
            shifted
        }
    } else {
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PI;

    #[test]
    fn wrap_0_2pi_negative_and_large() {
        assert!((wrap_0_2pi(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((wrap_0_2pi(5.0 * PI) - PI).abs() < 1e-12);
        assert_eq!(wrap_0_2pi(0.0), 0.0);
        assert_eq!(wrap_0_2pi(TWOPI), 0.0);
    }

    #[test]
    fn wrap_0_2pi_tiny_negative_is_zero_not_two_pi() {
        let w = wrap_0_2pi(-1e-18);
        assert!((0.0..TWOPI).contains(&w));
    }
}
