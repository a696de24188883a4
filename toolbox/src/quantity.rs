//! Values tagged with an optional physical unit.
//!
//! Replaces table-column units: a [`Quantity`] carries a value (scalar or
//! array) together with the unit it is expressed in, and arithmetic keeps the
//! unit attached. Adding or subtracting quantities with different units is a
//! programming error and panics.

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};

/// Units used by the toolbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[strum(serialize = "rad")]
    #[serde(rename = "rad")]
    Radian,
    #[strum(serialize = "deg")]
    #[serde(rename = "deg")]
    Degree,
    Arcsec,
    #[strum(serialize = "mas")]
    #[serde(rename = "mas")]
    Milliarcsec,
    #[strum(serialize = "mas/yr")]
    #[serde(rename = "mas/yr")]
    MasPerYear,
    #[strum(serialize = "km/s")]
    #[serde(rename = "km/s")]
    KmPerSecond,
    Pc,
    Kpc,
    #[strum(serialize = "pix")]
    #[serde(rename = "pix")]
    Pixel,
}

impl Unit {
    /// Conversion factor to radians for angular units.
    pub fn radians_per_unit(self) -> Option<f64> {
        const ARCSEC: f64 = std::f64::consts::PI / (180.0 * 3600.0);
        match self {
            Unit::Radian => Some(1.0),
            Unit::Degree => Some(std::f64::consts::PI / 180.0),
            Unit::Arcsec => Some(ARCSEC),
            Unit::Milliarcsec => Some(ARCSEC * 1e-3),
            _ => None,
        }
    }
}

/// A value with an optional unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity<T> {
    pub value: T,
    pub unit: Option<Unit>,
}

impl<T> Quantity<T> {
    pub fn new(value: T, unit: Unit) -> Self {
        Self {
            value,
            unit: Some(unit),
        }
    }

    pub fn dimensionless(value: T) -> Self {
        Self { value, unit: None }
    }

    /// Apply `f` to the value, keeping the unit.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Quantity<U> {
        Quantity {
            value: f(self.value),
            unit: self.unit,
        }
    }
}

impl Quantity<f64> {
    /// Angle in radians. Unitless values are taken to be radians already.
    pub fn to_radians(&self) -> Result<f64> {
        match self.unit {
            None => Ok(self.value),
            Some(unit) => unit
                .radians_per_unit()
                .map(|factor| self.value * factor)
                .ok_or(Error::InvalidParameter {
                    name: "unit",
                    reason: format!("'{unit}' is not an angle"),
                }),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Quantity<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.unit {
            Some(unit) => write!(f, "{} {}", self.value, unit),
            None => write!(f, "{}", self.value),
        }
    }
}

fn same_unit(lhs: Option<Unit>, rhs: Option<Unit>, op: &str) -> Option<Unit> {
    assert!(
        lhs == rhs,
        "cannot {op} quantities with units {lhs:?} and {rhs:?}"
    );
    lhs
}

impl Add for Quantity<f64> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
            unit: same_unit(self.unit, rhs.unit, "add"),
        }
    }
}

impl Sub for Quantity<f64> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            value: self.value - rhs.value,
            unit: same_unit(self.unit, rhs.unit, "subtract"),
        }
    }
}

impl Add for Quantity<Vec<f64>> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        assert_eq!(self.value.len(), rhs.value.len(), "quantity lengths differ");
        let unit = same_unit(self.unit, rhs.unit, "add");
        Self {
            value: self.value.iter().zip(&rhs.value).map(|(a, b)| a + b).collect(),
            unit,
        }
    }
}

impl Sub for Quantity<Vec<f64>> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        assert_eq!(self.value.len(), rhs.value.len(), "quantity lengths differ");
        let unit = same_unit(self.unit, rhs.unit, "subtract");
        Self {
            value: self.value.iter().zip(&rhs.value).map(|(a, b)| a - b).collect(),
            unit,
        }
    }
}

impl Neg for Quantity<f64> {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|v| -v)
    }
}

impl Mul<f64> for Quantity<f64> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|v| v * rhs)
    }
}

impl Div<f64> for Quantity<f64> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self.map(|v| v / rhs)
    }
}

impl Mul<f64> for Quantity<Vec<f64>> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|v| v.into_iter().map(|x| x * rhs).collect())
    }
}

impl Div<f64> for Quantity<Vec<f64>> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self.map(|v| v.into_iter().map(|x| x / rhs).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_unit_names_round_trip() {
        for unit in [Unit::Degree, Unit::MasPerYear, Unit::KmPerSecond, Unit::Kpc, Unit::Pixel] {
            assert_eq!(Unit::from_str(&unit.to_string()).unwrap(), unit);
        }
        assert_eq!(Unit::MasPerYear.to_string(), "mas/yr");
        assert_eq!(Unit::Arcsec.to_string(), "arcsec");
        assert!(Unit::from_str("furlong").is_err());
    }

    #[test]
    fn test_arithmetic_keeps_unit() {
        let a = Quantity::new(2.0, Unit::Kpc);
        let b = Quantity::new(0.5, Unit::Kpc);
        assert_eq!(a.clone() + b.clone(), Quantity::new(2.5, Unit::Kpc));
        assert_eq!(a.clone() - b, Quantity::new(1.5, Unit::Kpc));
        assert_eq!(a.clone() * 3.0, Quantity::new(6.0, Unit::Kpc));
        assert_eq!(-(a / 4.0), Quantity::new(-0.5, Unit::Kpc));
    }

    #[test]
    fn test_vector_arithmetic() {
        let a = Quantity::new(vec![1.0, 2.0], Unit::Milliarcsec);
        let b = Quantity::new(vec![0.5, 0.5], Unit::Milliarcsec);
        assert_eq!((a + b).value, vec![1.5, 2.5]);
    }

    #[test]
    #[should_panic(expected = "cannot add quantities")]
    fn test_mismatched_units_panic() {
        let _ = Quantity::new(1.0, Unit::Pc) + Quantity::new(1.0, Unit::Kpc);
    }

    #[test]
    fn test_to_radians() {
        let right = Quantity::new(90.0, Unit::Degree);
        assert!((right.to_radians().unwrap() - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        assert_eq!(Quantity::dimensionless(0.25).to_radians().unwrap(), 0.25);
        assert!(Quantity::new(1.0, Unit::Pc).to_radians().is_err());
        let mas = Quantity::new(3.6e6, Unit::Milliarcsec).to_radians().unwrap();
        assert!((mas - std::f64::consts::PI / 180.0).abs() < 1e-15);
    }

    #[test]
    fn test_display_and_serde() {
        let q = Quantity::new(1.5, Unit::KmPerSecond);
        assert_eq!(q.to_string(), "1.5 km/s");
        let yaml = common::serialize(&q, common::FileFormat::Yaml).unwrap();
        let back: Quantity<f64> = common::deserialize(&yaml, common::FileFormat::Yaml).unwrap();
        assert_eq!(back, q);
    }
}
