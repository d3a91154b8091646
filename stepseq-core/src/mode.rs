//! Numeric mode policy
//!
//! Integer and real generation differ in three places only: how two values
//! are compared, how division rounds, and how a computed value is normalized.
//! `NumericMode` is the one seam for all three.

use crate::{Number, NumberError};
use serde::{Deserialize, Serialize};

/// Absolute tolerance for real-mode equality
pub const REAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericMode {
    /// Exact integers, floor division
    Integer,
    /// f64 reals compared within `REAL_TOLERANCE`
    #[default]
    Real,
}

impl NumericMode {
    pub fn name(self) -> &'static str {
        match self {
            NumericMode::Integer => "integer",
            NumericMode::Real => "real",
        }
    }

    pub fn tolerance(self) -> f64 {
        match self {
            NumericMode::Integer => 0.0,
            NumericMode::Real => REAL_TOLERANCE,
        }
    }

    /// Equality used for convergence and cycle checks
    pub fn equal(self, a: &Number, b: &Number) -> bool {
        match self {
            NumericMode::Integer => a == b,
            NumericMode::Real => (a.to_f64() - b.to_f64()).abs() <= REAL_TOLERANCE,
        }
    }

    /// Divide in this mode: floor division for integers, true division for reals
    pub fn divide(self, a: &Number, b: &Number) -> Result<Number, NumberError> {
        match self {
            NumericMode::Integer => a.floor_div(b),
            NumericMode::Real => a.checked_div(b),
        }
    }

    /// Normalize a computed value into this mode
    ///
    /// Integer mode truncates toward zero; real mode widens integers to f64.
    pub fn coerce(self, value: Number) -> Result<Number, NumberError> {
        match self {
            NumericMode::Integer => value.trunc(),
            NumericMode::Real => Ok(value.to_real()),
        }
    }

    /// Parse user input as a number of this mode
    pub fn parse(self, s: &str) -> Result<Number, NumberError> {
        match self {
            NumericMode::Integer => Number::parse_int(s),
            NumericMode::Real => Number::parse_real(s),
        }
    }

    /// Whether `value` already has this mode's representation
    pub fn accepts(self, value: &Number) -> bool {
        match self {
            NumericMode::Integer => value.is_integer(),
            NumericMode::Real => !value.is_integer(),
        }
    }
}

impl std::fmt::Display for NumericMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
