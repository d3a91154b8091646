//! Generation requests
//!
//! A `Request` can only be built through `RequestBuilder`, which enforces every
//! precondition the engine relies on. `RequestConfig` is the serde form read
//! from request files.

use crate::detector::Bounds;
use crate::error::RequestError;
use crate::operation::{Operation, OperationKind};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use stepseq_core::{Number, NumberError, NumericMode};

/// Validated generation request
#[derive(Debug, Clone)]
pub struct Request {
    mode: NumericMode,
    start: Number,
    operation: Operation,
    length: usize,
    bounds: Bounds,
}

impl Request {
    pub fn builder(mode: NumericMode, start: Number) -> RequestBuilder {
        RequestBuilder::new(mode, start)
    }

    pub fn mode(&self) -> NumericMode {
        self.mode
    }

    pub fn start(&self) -> &Number {
        &self.start
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    mode: NumericMode,
    start: Number,
    operation: Option<Operation>,
    length: Option<usize>,
    bounds: Bounds,
}

impl RequestBuilder {
    pub fn new(mode: NumericMode, start: Number) -> Self {
        Self {
            mode,
            start,
            operation: None,
            length: None,
            bounds: Bounds::default(),
        }
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn upper_bound(mut self, bound: Number) -> Self {
        self.bounds.upper = Some(bound);
        self
    }

    pub fn lower_bound(mut self, bound: Number) -> Self {
        self.bounds.lower = Some(bound);
        self
    }

    pub fn bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn build(self) -> Result<Request, RequestError> {
        let mode = self.mode;
        let operation = self.operation.ok_or(RequestError::MissingOperation)?;
        let length = match self.length {
            Some(0) | None => return Err(RequestError::ZeroLength),
            Some(n) => n,
        };

        check_mode("start value", &self.start, mode)?;
        if let Some(operand) = operation.operand() {
            check_mode("operand", operand, mode)?;
        }
        if let Some(upper) = &self.bounds.upper {
            check_mode("upper bound", upper, mode)?;
        }
        if let Some(lower) = &self.bounds.lower {
            check_mode("lower bound", lower, mode)?;
        }
        if let (Some(upper), Some(lower)) = (&self.bounds.upper, &self.bounds.lower) {
            if upper < lower {
                return Err(RequestError::InvertedBounds {
                    upper: upper.clone(),
                    lower: lower.clone(),
                });
            }
        }

        Ok(Request {
            mode,
            start: self.start,
            operation,
            length,
            bounds: self.bounds,
        })
    }
}

fn check_mode(field: &'static str, value: &Number, mode: NumericMode) -> Result<(), RequestError> {
    if mode.accepts(value) {
        Ok(())
    } else {
        Err(RequestError::ModeMismatch {
            field,
            value: value.clone(),
            mode,
        })
    }
}

/// Largest magnitude at which every integral f64 is exact (2^53)
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Numeric literal as written in a request file: a JSON number or a string
///
/// Unsigned integers beyond `i64` keep their digits as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Text(String),
}

struct LiteralVisitor;

impl<'de> Visitor<'de> for LiteralVisitor {
    type Value = Literal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Literal, E> {
        Ok(Literal::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Literal, E> {
        Ok(i64::try_from(v).map_or_else(|_| Literal::Text(v.to_string()), Literal::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Literal, E> {
        Ok(Literal::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Literal, E> {
        Ok(Literal::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Literal, E> {
        Ok(Literal::Text(v))
    }
}

impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LiteralVisitor)
    }
}

impl Literal {
    /// The literal as it would have been typed at a prompt
    pub fn text(&self) -> String {
        match self {
            Literal::Int(n) => n.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::Text(s) => s.clone(),
        }
    }

    /// Parse in `mode`
    ///
    /// In integer mode a JSON float is only accepted while it is exact; larger
    /// integers must be written as strings.
    pub fn parse(&self, field: &'static str, mode: NumericMode) -> Result<Number, RequestError> {
        if let (NumericMode::Integer, Literal::Float(f)) = (mode, self) {
            if f.abs() > MAX_EXACT_FLOAT_INT {
                return Err(RequestError::InvalidNumber {
                    field,
                    source: NumberError::ParseError(format!(
                        "{} is not exact; write large integers as strings",
                        f
                    )),
                });
            }
        }
        mode.parse(&self.text())
            .map_err(|source| RequestError::InvalidNumber { field, source })
    }
}

/// Request as stored in a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestConfig {
    #[serde(default)]
    pub mode: NumericMode,
    pub start: Literal,
    pub operation: OperationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<Literal>,
    /// Output file; the CLI appends `.csv` when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl RequestConfig {
    /// Validate into a `Request`, optionally forcing the numeric mode
    pub fn to_request(&self, mode_override: Option<NumericMode>) -> Result<Request, RequestError> {
        let mode = mode_override.unwrap_or(self.mode);
        let start = self.start.parse("start value", mode)?;

        let operation = match self.operation {
            OperationKind::Custom => {
                let expression = self.expression.as_deref().ok_or(RequestError::MissingOperand {
                    operation: "custom",
                    what: "an expression",
                })?;
                Operation::custom(expression)?
            }
            kind => {
                let operand = self.operand.as_ref().ok_or(RequestError::MissingOperand {
                    operation: kind.name(),
                    what: "an operand",
                })?;
                Operation::from_parts(kind, &operand.text(), mode)?
            }
        };

        let mut builder = Request::builder(mode, start)
            .operation(operation)
            .length(self.length);
        if let Some(upper) = &self.upper_bound {
            builder = builder.upper_bound(upper.parse("upper bound", mode)?);
        }
        if let Some(lower) = &self.lower_bound {
            builder = builder.lower_bound(lower.parse("lower bound", mode)?);
        }
        builder.build()
    }
}
