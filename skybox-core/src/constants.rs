//! Numeric constants for sky geometry.

pub const PI: f64 = 3.141592653589793238462643;

pub const HALF_PI: f64 = 1.5707963267948966192313216;

pub const TWOPI: f64 = 6.283185307179586476925287;

pub const FOUR_PI: f64 = 12.566370614359172953850574;

pub const DEG_TO_RAD: f64 = 1.745329251994329576923691e-2;

pub const RAD_TO_DEG: f64 = 57.29577951308232087679815;

/// Tolerance used when checking `x² + y² + z² = 1` on stored points.
pub const UNIT_NORM_TOLERANCE: f64 = 1e-12;
