//! Step operations
//!
//! add, subtract, multiply, divide by a fixed operand, or a custom expression
//! of the previous value `x`.

use crate::error::{GenerationError, RequestError};
use crate::expr::Expression;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use stepseq_core::{EvalError, Number, NumericMode};

/// Variable bound to the previous value in custom expressions
pub const PLACEHOLDER: &str = "x";

/// Operation name without its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Custom,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Add,
        OperationKind::Subtract,
        OperationKind::Multiply,
        OperationKind::Divide,
        OperationKind::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Subtract => "subtract",
            OperationKind::Multiply => "multiply",
            OperationKind::Divide => "divide",
            OperationKind::Custom => "custom",
        }
    }
}

impl FromStr for OperationKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| RequestError::UnknownOperation(s.trim().to_string()))
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Custom step: an expression in the placeholder variable
#[derive(Debug, Clone)]
pub struct CustomStep {
    expression: Expression,
}

impl CustomStep {
    /// Parse and check a custom expression
    ///
    /// The expression must reference the placeholder and nothing else.
    pub fn new(source: &str) -> Result<Self, RequestError> {
        let expression = Expression::parse(source.trim()).map_err(|cause| {
            RequestError::InvalidExpression {
                expression: source.to_string(),
                cause,
            }
        })?;

        if !expression.references(PLACEHOLDER) {
            return Err(RequestError::MissingPlaceholder {
                placeholder: PLACEHOLDER,
            });
        }
        if let Some(other) = expression
            .ast()
            .variables()
            .into_iter()
            .find(|name| *name != PLACEHOLDER)
        {
            return Err(RequestError::InvalidExpression {
                expression: source.to_string(),
                cause: EvalError::undefined_var(other).with_expression(source),
            });
        }

        Ok(Self { expression })
    }

    pub fn source(&self) -> &str {
        self.expression.source()
    }

    /// Evaluate with the placeholder bound to `previous`
    pub fn apply(&self, previous: &Number) -> Result<Number, EvalError> {
        self.expression.eval_with(PLACEHOLDER, previous)
    }
}

/// One recurrence step
#[derive(Debug, Clone)]
pub enum Operation {
    Add(Number),
    Subtract(Number),
    Multiply(Number),
    Divide(Number),
    Custom(CustomStep),
}

impl Operation {
    pub fn custom(source: &str) -> Result<Self, RequestError> {
        CustomStep::new(source).map(Operation::Custom)
    }

    /// Build from an operation kind and its raw argument text
    ///
    /// The argument is the expression for `custom` and an operand parsed in
    /// `mode` otherwise.
    pub fn from_parts(
        kind: OperationKind,
        argument: &str,
        mode: NumericMode,
    ) -> Result<Self, RequestError> {
        let build: fn(Number) -> Operation = match kind {
            OperationKind::Add => Operation::Add,
            OperationKind::Subtract => Operation::Subtract,
            OperationKind::Multiply => Operation::Multiply,
            OperationKind::Divide => Operation::Divide,
            OperationKind::Custom => return Self::custom(argument),
        };
        let operand = mode
            .parse(argument)
            .map_err(|source| RequestError::InvalidNumber {
                field: "operand",
                source,
            })?;
        Ok(build(operand))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Add(_) => OperationKind::Add,
            Operation::Subtract(_) => OperationKind::Subtract,
            Operation::Multiply(_) => OperationKind::Multiply,
            Operation::Divide(_) => OperationKind::Divide,
            Operation::Custom(_) => OperationKind::Custom,
        }
    }

    pub fn operand(&self) -> Option<&Number> {
        match self {
            Operation::Add(n)
            | Operation::Subtract(n)
            | Operation::Multiply(n)
            | Operation::Divide(n) => Some(n),
            Operation::Custom(_) => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Custom(c) => write!(f, "custom({})", c.source()),
            other => match other.operand() {
                Some(n) => write!(f, "{}({})", other.kind(), n),
                None => write!(f, "{}", other.kind()),
            },
        }
    }
}

/// Compute the next value of the sequence
///
/// Pure: identical inputs always give identical results.
pub fn step(
    previous: &Number,
    op: &Operation,
    mode: NumericMode,
) -> Result<Number, GenerationError> {
    let raw = match op {
        Operation::Add(v) => previous.add(v),
        Operation::Subtract(v) => previous.sub(v),
        Operation::Multiply(v) => previous.mul(v),
        Operation::Divide(v) => mode.divide(previous, v)?,
        Operation::Custom(custom) => {
            return apply_custom(custom, previous, mode).map_err(|cause| {
                GenerationError::CustomEvaluation {
                    expression: custom.source().to_string(),
                    cause,
                }
            });
        }
    };
    Ok(mode.coerce(raw)?)
}

fn apply_custom(
    custom: &CustomStep,
    previous: &Number,
    mode: NumericMode,
) -> Result<Number, EvalError> {
    let value = custom.apply(previous)?;
    if value.is_nan() {
        return Err(EvalError::not_a_number().with_expression(custom.source()));
    }
    mode.coerce(value)
        .map_err(|e| EvalError::from(e).with_expression(custom.source()))
}
