//! Numbers for sequence generation
//!
//! A `Number` is either an exact, unbounded integer (dashu-int `IBig`) or an
//! `f64` real. Mixed arithmetic follows the usual scripting-language rules:
//! integer operands stay exact, true division and anything touching a real
//! produce a real.

use dashu_int::IBig;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Overflow: result too large")]
    Overflow,
}

/// Largest integer exponent accepted by exact exponentiation
pub const MAX_EXACT_EXPONENT: usize = 65_536;

/// Exact integer or real number
#[derive(Debug, Clone)]
pub enum Number {
    Int(IBig),
    Real(f64),
}

impl Number {
    // ========== Construction ==========

    pub fn from_i64(n: i64) -> Self {
        Number::Int(IBig::from(n))
    }

    pub fn from_f64(f: f64) -> Self {
        Number::Real(f)
    }

    /// Parse an integer literal ("42", "-7", "+3", surrounding whitespace allowed)
    pub fn parse_int(s: &str) -> Result<Self, NumberError> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(NumberError::ParseError(s.to_string()));
        }
        digits
            .parse::<IBig>()
            .map(Number::Int)
            .map_err(|_| NumberError::ParseError(s.to_string()))
    }

    /// Parse a real literal ("3.14", "1e-5", "-2", "inf")
    pub fn parse_real(s: &str) -> Result<Self, NumberError> {
        s.trim()
            .parse::<f64>()
            .map(Number::Real)
            .map_err(|_| NumberError::ParseError(s.to_string()))
    }

    /// Parse a source literal: integer syntax stays exact, anything with a
    /// fraction or exponent becomes real
    pub fn parse_literal(s: &str) -> Result<Self, NumberError> {
        if s.contains(['.', 'e', 'E']) {
            Self::parse_real(s)
        } else {
            Self::parse_int(s)
        }
    }

    // ========== Predicates ==========

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(n) => *n == IBig::ZERO,
            Number::Real(f) => *f == 0.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Int(n) => *n < IBig::ZERO,
            Number::Real(f) => *f < 0.0,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Number::Real(f) if f.is_nan())
    }

    // ========== Conversion ==========

    /// Convert to f64 (large integers lose precision, or become infinite)
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(n) => int_to_f64(n),
            Number::Real(f) => *f,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Number::Int(n) => i64::try_from(n.clone()).ok(),
            Number::Real(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<&IBig> {
        match self {
            Number::Int(n) => Some(n),
            Number::Real(_) => None,
        }
    }

    pub fn to_real(&self) -> Self {
        Number::Real(self.to_f64())
    }

    /// Truncate toward zero to an exact integer
    pub fn trunc(&self) -> Result<Self, NumberError> {
        match self {
            Number::Int(_) => Ok(self.clone()),
            Number::Real(f) => f64_to_int(f.trunc()).map(Number::Int),
        }
    }

    /// Largest integer <= x
    pub fn floor(&self) -> Result<Self, NumberError> {
        match self {
            Number::Int(_) => Ok(self.clone()),
            Number::Real(f) => f64_to_int(f.floor()).map(Number::Int),
        }
    }

    /// Smallest integer >= x
    pub fn ceil(&self) -> Result<Self, NumberError> {
        match self {
            Number::Int(_) => Ok(self.clone()),
            Number::Real(f) => f64_to_int(f.ceil()).map(Number::Int),
        }
    }

    /// Nearest integer, ties to even
    pub fn round(&self) -> Result<Self, NumberError> {
        match self {
            Number::Int(_) => Ok(self.clone()),
            Number::Real(f) => f64_to_int(f.round_ties_even()).map(Number::Int),
        }
    }

    // ========== Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a + b),
            _ => Number::Real(self.to_f64() + other.to_f64()),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a - b),
            _ => Number::Real(self.to_f64() - other.to_f64()),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a * b),
            _ => Number::Real(self.to_f64() * other.to_f64()),
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Number::Int(n) => Number::Int(-n.clone()),
            Number::Real(f) => Number::Real(-f),
        }
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            self.neg()
        } else {
            self.clone()
        }
    }

    /// True division, always real
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        Ok(Number::Real(self.to_f64() / other.to_f64()))
    }

    /// Division rounded toward negative infinity
    pub fn floor_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                let quotient = a / b;
                let remainder = a - &(&quotient * b);
                if remainder != IBig::ZERO && ((remainder < IBig::ZERO) != (*b < IBig::ZERO)) {
                    Ok(Number::Int(quotient - IBig::ONE))
                } else {
                    Ok(Number::Int(quotient))
                }
            }
            _ => Ok(Number::Real((self.to_f64() / other.to_f64()).floor())),
        }
    }

    /// Remainder carrying the sign of the divisor
    pub fn rem(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                let remainder = a % b;
                if remainder != IBig::ZERO && ((remainder < IBig::ZERO) != (*b < IBig::ZERO)) {
                    Ok(Number::Int(remainder + b))
                } else {
                    Ok(Number::Int(remainder))
                }
            }
            _ => {
                let (a, b) = (self.to_f64(), other.to_f64());
                let r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    Ok(Number::Real(r + b))
                } else {
                    Ok(Number::Real(r))
                }
            }
        }
    }

    /// Exponentiation; integer base with a non-negative integer exponent stays exact
    pub fn pow(&self, exp: &Self) -> Result<Self, NumberError> {
        if let (Number::Int(base), Number::Int(e)) = (self, exp) {
            if *e >= IBig::ZERO {
                let e = usize::try_from(e.clone()).map_err(|_| NumberError::Overflow)?;
                if e > MAX_EXACT_EXPONENT {
                    return Err(NumberError::Overflow);
                }
                return Ok(Number::Int(base.pow(e)));
            }
        }

        let (base, e) = (self.to_f64(), exp.to_f64());
        if base == 0.0 && e < 0.0 {
            return Err(NumberError::DivisionByZero);
        }
        if base < 0.0 && e.fract() != 0.0 && e.is_finite() {
            return Err(NumberError::DomainError(
                "negative number raised to a fractional power".to_string(),
            ));
        }
        let result = base.powf(e);
        if result.is_infinite() && base.is_finite() && e.is_finite() {
            return Err(NumberError::Overflow);
        }
        Ok(Number::Real(result))
    }

    pub fn sqrt(&self) -> Result<Self, NumberError> {
        if self.is_negative() {
            return Err(NumberError::DomainError(
                "square root of negative number".to_string(),
            ));
        }
        Ok(Number::Real(self.to_f64().sqrt()))
    }
}

fn int_to_f64(n: &IBig) -> f64 {
    match i64::try_from(n.clone()) {
        Ok(small) => small as f64,
        // Decimal digits always parse; magnitudes past f64::MAX become infinite
        Err(_) => n.to_string().parse().unwrap_or(f64::NAN),
    }
}

fn f64_to_int(f: f64) -> Result<IBig, NumberError> {
    if f.is_nan() {
        return Err(NumberError::DomainError(
            "cannot convert NaN to integer".to_string(),
        ));
    }
    if f.is_infinite() {
        return Err(NumberError::Overflow);
    }
    if f.abs() < 9.0e18 {
        return Ok(IBig::from(f as i64));
    }
    format!("{:.0}", f)
        .parse::<IBig>()
        .map_err(|_| NumberError::ParseError(f.to_string()))
}

// ========== Trait Implementations ==========

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Real(x) if x.is_nan() => write!(f, "nan"),
            Number::Real(x) if x.is_infinite() => {
                write!(f, "{}", if *x > 0.0 { "inf" } else { "-inf" })
            }
            Number::Real(x) => f.write_str(&format_real(*x)),
        }
    }
}

/// Shortest round-trip form, `.0` on integral values, exponents as `e+16`/`e-05`
fn format_real(x: f64) -> String {
    let repr = format!("{:?}", x);
    match repr.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::Int(n) => match i64::try_from(n.clone()) {
                Ok(small) => serializer.serialize_i64(small),
                Err(_) => serializer.serialize_str(&n.to_string()),
            },
            Number::Real(x) => serializer.serialize_f64(*x),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.to_f64() == other.to_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::from_i64(n)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Real(f)
    }
}

impl From<IBig> for Number {
    fn from(n: IBig) -> Self {
        Number::Int(n)
    }
}
