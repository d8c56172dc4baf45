//! Angle parsing from strings.
//!
//! Sexagesimal forms accepted by [`parse_hms`] and [`parse_dms`]:
//!
//! ```text
//! Colon-separated:  12:34:56.789     -05:22:30
//! Letter markers:   12h34m56.789s    +38d47m01s
//! Spaced:           12 34 56         45d 30' 15"
//! ```
//!
//! A sign is only valid at the very start. Decimal values go through
//! [`AngleUnits`], which names the unit explicitly:
//!
//! ```
//! use skybox_core::angle::AngleUnits;
//!
//! let ra = "05:35:17.3".hms().unwrap();
//! let dec = "-5.391".deg().unwrap();
//! let rho = "5".arcmin().unwrap();
//! assert!(ra.hours() > 5.5 && dec.degrees() < 0.0 && rho.degrees() < 0.1);
//! ```

use super::Angle;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Parse strings as angles with an explicit unit.
pub trait AngleUnits {
    /// Decimal degrees.
    fn deg(&self) -> Result<Angle>;
    /// Radians.
    fn rad(&self) -> Result<Angle>;
    /// Decimal hours (1h = 15°).
    fn hours(&self) -> Result<Angle>;
    fn arcmin(&self) -> Result<Angle>;
    fn arcsec(&self) -> Result<Angle>;
    /// Degrees-minutes-seconds. See module docs for accepted forms.
    fn dms(&self) -> Result<Angle>;
    /// Hours-minutes-seconds. See module docs for accepted forms.
    fn hms(&self) -> Result<Angle>;
}

impl AngleUnits for str {
    #[inline]
    fn deg(&self) -> Result<Angle> {
        parse_decimal(self).map(Angle::from_degrees)
    }

    #[inline]
    fn rad(&self) -> Result<Angle> {
        parse_decimal(self).map(Angle::from_radians)
    }

    #[inline]
    fn hours(&self) -> Result<Angle> {
        parse_decimal(self).map(Angle::from_hours)
    }

    #[inline]
    fn arcmin(&self) -> Result<Angle> {
        parse_decimal(self).map(Angle::from_arcminutes)
    }

    #[inline]
    fn arcsec(&self) -> Result<Angle> {
        parse_decimal(self).map(Angle::from_arcseconds)
    }

    #[inline]
    fn dms(&self) -> Result<Angle> {
        parse_dms(self)
    }

    #[inline]
    fn hms(&self) -> Result<Angle> {
        parse_hms(self)
    }
}

fn parse_decimal(s: &str) -> Result<f64> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| Error::configuration("angle", format!("Cannot parse '{}' as number", s)))?;
    if !value.is_finite() {
        return Err(Error::domain("parse_decimal", format!("'{}' is not finite", s)));
    }
    Ok(value)
}

static HMS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        ^([+-])?
        (\d{1,3}) \s* (?:[:hH]|\s) \s*
        (\d{1,2}) \s* (?:[:mM']|\s) \s*
        (\d{1,2}(?:\.\d+)?) \s* [sS"]?
        $"#,
    )
    .expect("HMS pattern is valid")
});

static DMS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        ^([+-])?
        (\d{1,3}) \s* (?:[:dD°]|\s) \s*
        (\d{1,2}) \s* (?:[:mM']|\s) \s*
        (\d{1,2}(?:\.\d+)?) \s* (?:[sS"]|'')?
        $"#,
    )
    .expect("DMS pattern is valid")
});

/// Parse hours-minutes-seconds; the result is interpreted as hours.
pub fn parse_hms(s: &str) -> Result<Angle> {
    let (sign, h, m, sec) = sexagesimal(&HMS_REGEX, s, "HMS")?;
    Ok(Angle::from_hours(sign * (h + m / 60.0 + sec / 3600.0)))
}

/// Parse degrees-minutes-seconds; the result is interpreted as degrees.
pub fn parse_dms(s: &str) -> Result<Angle> {
    let (sign, d, m, sec) = sexagesimal(&DMS_REGEX, s, "DMS")?;
    Ok(Angle::from_degrees(sign * (d + m / 60.0 + sec / 3600.0)))
}

fn sexagesimal(re: &Regex, s: &str, format: &str) -> Result<(f64, f64, f64, f64)> {
    let trimmed = s.trim();
    let caps = re.captures(trimmed).ok_or_else(|| {
        Error::configuration("angle", format!("Cannot parse '{}' as {} format", s, format))
    })?;

    let sign = match caps.get(1).map(|m| m.as_str()) {
        Some("-") => -1.0,
        _ => 1.0,
    };
    let field = |i: usize| -> Result<f64> {
        caps[i].parse::<f64>().map_err(|_| {
            Error::configuration("angle", format!("Bad {} field in '{}'", format, s))
        })
    };
    let (major, minutes, seconds) = (field(2)?, field(3)?, field(4)?);

    if minutes >= 60.0 || seconds >= 60.0 {
        return Err(Error::configuration(
            "angle",
            format!("Minutes and seconds must be < 60 in '{}'", s),
        ));
    }

    Ok((sign, major, minutes, seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_decimal_parsing() {
        assert_eq!("45.5".deg().unwrap().degrees(), 45.5);
        assert!(("12.5".hours().unwrap().hours() - 12.5).abs() < EPSILON);
        assert!(("60.0".arcmin().unwrap().degrees() - 1.0).abs() < EPSILON);
        assert!(("3600.0".arcsec().unwrap().degrees() - 1.0).abs() < EPSILON);
        assert_eq!("  -45.5  ".deg().unwrap().degrees(), -45.5);
        assert_eq!("1.25".rad().unwrap().radians(), 1.25);
    }

    #[test]
    fn test_hms_formats() {
        let expected = 12.0 + 34.0 / 60.0 + 56.0 / 3600.0;
        for input in ["12:34:56", "12h34m56s", "12h 34m 56s", "12 34 56", " 12:34:56 "] {
            let angle = input.hms().unwrap();
            assert!(
                (angle.hours() - expected).abs() < EPSILON,
                "input {:?} gave {}",
                input,
                angle.hours()
            );
        }

        let angle = "12:34:56.789".hms().unwrap();
        assert!((angle.hours() - (12.0 + 34.0 / 60.0 + 56.789 / 3600.0)).abs() < EPSILON);
    }

    #[test]
    fn test_dms_formats() {
        let expected = 45.0 + 30.0 / 60.0 + 15.0 / 3600.0;
        for input in ["45:30:15", "45d30m15s", "45d 30' 15\"", "45d 30' 15''", "+45:30:15"] {
            let angle = input.dms().unwrap();
            assert!(
                (angle.degrees() - expected).abs() < EPSILON,
                "input {:?} gave {}",
                input,
                angle.degrees()
            );
        }
    }

    #[test]
    fn test_sign_handling() {
        let angle = "-05:22:30".dms().unwrap();
        assert!((angle.degrees() + (5.0 + 22.0 / 60.0 + 30.0 / 3600.0)).abs() < EPSILON);
        assert!("-5:30:45".hms().unwrap().hours() < 0.0);

        assert!("45:-30:15".dms().is_err());
        assert!("12:34:-56".hms().is_err());
    }

    #[test]
    fn test_error_cases() {
        assert!("not_a_number".deg().is_err());
        assert!("".deg().is_err());
        assert!("12:34".hms().is_err());
        assert!(":12:34".hms().is_err());
        assert!("12:75:00".hms().is_err());
        assert!("10:00:60".dms().is_err());
    }

    #[test]
    fn test_non_finite_decimal_is_domain_error() {
        let err = "inf".deg().unwrap_err();
        assert!(matches!(err, Error::Domain { .. }));
    }
}
