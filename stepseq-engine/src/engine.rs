//! Recurrence engine
//!
//! A `Generation` owns one run: the growing sequence and its termination
//! detector. It moves from `Running` to exactly one terminal state and never
//! leaves it.

use crate::detector::{Termination, TerminationDetector};
use crate::error::GenerationError;
use crate::operation::step;
use crate::request::Request;
use serde::Serialize;
use stepseq_core::Number;
use tracing::{debug, trace};

/// Lifecycle of a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Exhausted,
    Diverged,
    Converged,
    CycleDetected,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        self != RunState::Running
    }
}

impl Termination {
    pub fn state(&self) -> RunState {
        match self {
            Termination::Exhausted => RunState::Exhausted,
            Termination::Diverged { .. } => RunState::Diverged,
            Termination::Converged { .. } => RunState::Converged,
            Termination::CycleDetected { .. } => RunState::CycleDetected,
        }
    }
}

/// Finished run: the sequence and why it stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub sequence: Vec<Number>,
    pub termination: Termination,
}

impl Outcome {
    pub fn state(&self) -> RunState {
        self.termination.state()
    }

    pub fn advisory(&self) -> Option<String> {
        self.termination.advisory()
    }
}

/// One generation run, advanced a step at a time
#[derive(Debug)]
pub struct Generation<'r> {
    request: &'r Request,
    sequence: Vec<Number>,
    detector: TerminationDetector,
    remaining: usize,
    termination: Option<Termination>,
    failure: Option<GenerationError>,
}

impl<'r> Generation<'r> {
    pub fn new(request: &'r Request) -> Self {
        let start = request.start().clone();
        let detector = TerminationDetector::new(request.mode(), request.bounds().clone(), &start);
        debug!(
            mode = %request.mode(),
            operation = %request.operation(),
            length = request.length(),
            start = %start,
            "starting generation"
        );
        let mut sequence = Vec::with_capacity(request.length().min(4096));
        sequence.push(start);
        Self {
            request,
            sequence,
            detector,
            remaining: request.length() - 1,
            termination: None,
            failure: None,
        }
    }

    pub fn state(&self) -> RunState {
        match (&self.termination, &self.failure) {
            (_, Some(_)) => RunState::Failed,
            (Some(termination), None) => termination.state(),
            (None, None) => RunState::Running,
        }
    }

    /// Values produced so far
    pub fn sequence(&self) -> &[Number] {
        &self.sequence
    }

    /// Take one step
    ///
    /// Once terminal, further calls return the same state (or the same error)
    /// without doing any work.
    pub fn advance(&mut self) -> Result<RunState, GenerationError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.termination.is_some() {
            return Ok(self.state());
        }
        if self.remaining == 0 {
            debug!(len = self.sequence.len(), "requested length reached");
            self.termination = Some(Termination::Exhausted);
            return Ok(RunState::Exhausted);
        }

        let previous = self.sequence.last().unwrap_or(self.request.start());
        let current = match step(previous, self.request.operation(), self.request.mode()) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, code = err.code(), "generation failed");
                self.failure = Some(err.clone());
                return Err(err);
            }
        };
        trace!(index = self.sequence.len(), value = %current, "step");
        self.remaining -= 1;

        match self.detector.inspect(previous, &current) {
            Some(termination) => {
                if termination.keeps_value() {
                    self.sequence.push(current);
                }
                debug!(state = ?termination.state(), len = self.sequence.len(), "terminated early");
                let state = termination.state();
                self.termination = Some(termination);
                Ok(state)
            }
            None => {
                self.sequence.push(current);
                Ok(RunState::Running)
            }
        }
    }

    /// Drive the run to its terminal state
    pub fn finish(mut self) -> Result<Outcome, GenerationError> {
        while !self.advance()?.is_terminal() {}
        let termination = self.termination.unwrap_or(Termination::Exhausted);
        Ok(Outcome {
            sequence: self.sequence,
            termination,
        })
    }
}

/// Generate the sequence described by `request`
pub fn generate(request: &Request) -> Result<Outcome, GenerationError> {
    Generation::new(request).finish()
}
