//! Interactive request entry
//!
//! Reads answers line by line from any `BufRead` and writes prompts to any
//! `Write`, so the whole dialogue can be driven from memory in tests.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use stepseq_core::{Number, NumericMode};
use stepseq_engine::{Operation, OperationKind, Request, RequestError};
use thiserror::Error;
use tracing::debug;

use crate::output::csv_filename;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Invalid input. Please enter valid numbers.")]
    InvalidNumber,

    #[error("Invalid operation. Please choose from the available options.")]
    InvalidOperation,

    #[error("Sequence length must be a positive integer.")]
    InvalidLength,

    #[error("{0}")]
    Request(#[from] RequestError),

    #[error("Input ended before the request was complete")]
    EndOfInput,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A request together with where its output goes
#[derive(Debug, Clone)]
pub struct Job {
    pub request: Request,
    pub output: PathBuf,
}

enum BoundAnswer {
    Skip,
    Value(Number),
    Invalid,
}

impl BoundAnswer {
    fn into_option(self) -> Option<Number> {
        match self {
            BoundAnswer::Value(bound) => Some(bound),
            BoundAnswer::Skip | BoundAnswer::Invalid => None,
        }
    }
}

struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::EndOfInput);
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, message: &str) -> Result<(), PromptError> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    fn ask_number(&mut self, prompt: &str, mode: NumericMode) -> Result<Number, PromptError> {
        let answer = self.ask(prompt)?;
        mode.parse(&answer).map_err(|_| PromptError::InvalidNumber)
    }

    fn ask_bound(&mut self, prompt: &str, mode: NumericMode) -> Result<BoundAnswer, PromptError> {
        let answer = self.ask(prompt)?;
        if answer.is_empty() {
            return Ok(BoundAnswer::Skip);
        }
        Ok(match mode.parse(&answer) {
            Ok(bound) => BoundAnswer::Value(bound),
            Err(_) => BoundAnswer::Invalid,
        })
    }

    /// An unparsable bound discards both bounds
    fn ask_bounds(
        &mut self,
        mode: NumericMode,
    ) -> Result<(Option<Number>, Option<Number>), PromptError> {
        let upper = match self.ask_bound("Enter upper bound (or press Enter to skip): ", mode)? {
            BoundAnswer::Invalid => return self.ignore_bounds(),
            answer => answer.into_option(),
        };
        let lower = match self.ask_bound("Enter lower bound (or press Enter to skip): ", mode)? {
            BoundAnswer::Invalid => return self.ignore_bounds(),
            answer => answer.into_option(),
        };
        Ok((upper, lower))
    }

    fn ignore_bounds(&mut self) -> Result<(Option<Number>, Option<Number>), PromptError> {
        self.say("Invalid bound value. Bounds must be numbers.")?;
        self.say("Invalid input. Ignoring divergence bounds.")?;
        Ok((None, None))
    }
}

/// Ask for every field of a request, one answer per line
pub fn prompt_job<R: BufRead, W: Write>(
    input: R,
    output: W,
    mode: NumericMode,
) -> Result<Job, PromptError> {
    let mut p = Prompter { input, output };

    let start = p.ask_number("Enter the starting number: ", mode)?;

    let names: Vec<&str> = OperationKind::ALL.iter().map(|k| k.name()).collect();
    p.say(&format!("Available operations: {}", names.join(", ")))?;
    let kind: OperationKind = p
        .ask("Enter the operation: ")?
        .parse()
        .map_err(|_| PromptError::InvalidOperation)?;

    let operation = match kind {
        OperationKind::Custom => {
            let source = p.ask(
                "Enter a custom function (e.g., x * 2 + 1, where 'x' = previous number): ",
            )?;
            Operation::custom(&source)?
        }
        kind => {
            let answer = p.ask(&format!("Enter the value to {} by: ", kind))?;
            Operation::from_parts(kind, &answer, mode).map_err(|_| PromptError::InvalidNumber)?
        }
    };

    let length: i64 = p
        .ask("Enter the length of the sequence to generate: ")?
        .parse()
        .map_err(|_| PromptError::InvalidNumber)?;
    let length = usize::try_from(length)
        .ok()
        .filter(|n| *n > 0)
        .ok_or(PromptError::InvalidLength)?;

    let filename = p.ask("Enter the output filename (e.g., sequence.csv): ")?;

    let add_bounds = p.ask("Add bounds for divergence detection? (yes/no): ")?;
    let (upper, lower) = if add_bounds.eq_ignore_ascii_case("yes") {
        p.ask_bounds(mode)?
    } else {
        (None, None)
    };

    let mut builder = Request::builder(mode, start)
        .operation(operation)
        .length(length);
    if let Some(upper) = upper {
        builder = builder.upper_bound(upper);
    }
    if let Some(lower) = lower {
        builder = builder.lower_bound(lower);
    }
    let request = builder.build()?;
    debug!(operation = %request.operation(), length, "request entered interactively");

    Ok(Job {
        request,
        output: csv_filename(&filename),
    })
}
