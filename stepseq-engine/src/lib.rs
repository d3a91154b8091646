//! stepseq Engine
//!
//! Generates a sequence by repeatedly applying one step to the previous value,
//! stopping early on divergence past a bound, convergence to a fixed point, or
//! repetition of an earlier value. Step failures abort the run; early stops do
//! not, and are reported as the `Termination` of an otherwise normal `Outcome`.
//!
//! ```
//! use stepseq_core::{Number, NumericMode};
//! use stepseq_engine::{generate, Operation, Request, RunState};
//!
//! let request = Request::builder(NumericMode::Integer, Number::from_i64(0))
//!     .operation(Operation::Add(Number::from_i64(1)))
//!     .length(100)
//!     .upper_bound(Number::from_i64(3))
//!     .build()
//!     .unwrap();
//! let outcome = generate(&request).unwrap();
//! assert_eq!(outcome.sequence.len(), 4);
//! assert_eq!(outcome.state(), RunState::Diverged);
//! ```

mod detector;
mod engine;
mod error;
mod expr;
mod operation;
mod request;

pub use detector::{Bounds, Direction, SeenSet, Termination, TerminationDetector};
pub use engine::{generate, Generation, Outcome, RunState};
pub use error::{codes, GenerationError, RequestError};
pub use expr::{Expr, Expression, Func, Op};
pub use operation::{step, CustomStep, Operation, OperationKind, PLACEHOLDER};
pub use request::{Literal, Request, RequestBuilder, RequestConfig};
