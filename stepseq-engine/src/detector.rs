//! Termination detection
//!
//! After each step the new value is checked, in order, for divergence past a
//! bound, convergence onto the previous value, and repetition of any value
//! seen earlier in the run. The first match stops generation.

use dashu_int::IBig;
use serde::Serialize;
use std::collections::HashSet;
use stepseq_core::{Number, NumericMode};

/// Which bound a diverging value crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upper,
    Lower,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Upper => "upper",
            Direction::Lower => "lower",
        })
    }
}

/// Optional divergence bounds, each checked independently
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<Number>,
}

impl Bounds {
    pub fn new(upper: Option<Number>, lower: Option<Number>) -> Self {
        Self { upper, lower }
    }

    pub fn is_empty(&self) -> bool {
        self.upper.is_none() && self.lower.is_none()
    }

    /// The bound `value` lies beyond, upper checked first
    pub fn violated_by(&self, value: &Number) -> Option<(Direction, &Number)> {
        if let Some(upper) = self.upper.as_ref().filter(|upper| value > *upper) {
            return Some((Direction::Upper, upper));
        }
        if let Some(lower) = self.lower.as_ref().filter(|lower| value < *lower) {
            return Some((Direction::Lower, lower));
        }
        None
    }
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Termination {
    /// Requested length reached
    Exhausted,
    /// Value crossed a bound; it was not appended
    Diverged {
        direction: Direction,
        bound: Number,
        value: Number,
    },
    /// Value equal to its predecessor; appended
    Converged { value: Number, previous: Number },
    /// Value equal to one seen earlier; appended
    ///
    /// `within_tolerance` is set for real runs, where the match is approximate.
    CycleDetected { value: Number, within_tolerance: bool },
}

impl Termination {
    /// Whether the value that triggered this termination belongs in the sequence
    pub fn keeps_value(&self) -> bool {
        !matches!(self, Termination::Diverged { .. })
    }

    /// Message for the caller to display when the run stopped early
    pub fn advisory(&self) -> Option<String> {
        match self {
            Termination::Exhausted => None,
            Termination::Diverged { direction, bound, value } => Some(format!(
                "Divergence detected: {} exceeded {} bound of {}.",
                value, direction, bound
            )),
            Termination::Converged { value, previous } => Some(format!(
                "Convergence detected: Sequence stabilized at {} (previous: {}).",
                value, previous
            )),
            Termination::CycleDetected { value, within_tolerance } => Some(format!(
                "Cycle detected: Number {} repeated{}. Sequence is entering a loop.",
                value,
                if *within_tolerance { " (within tolerance)" } else { "" }
            )),
        }
    }
}

/// Values produced so far in one run
///
/// Integer runs hash exact values; real runs scan linearly with tolerance.
#[derive(Debug, Clone)]
pub enum SeenSet {
    Exact(HashSet<IBig>),
    Tolerant(Vec<f64>),
}

impl SeenSet {
    pub fn new(mode: NumericMode) -> Self {
        match mode {
            NumericMode::Integer => SeenSet::Exact(HashSet::new()),
            NumericMode::Real => SeenSet::Tolerant(Vec::new()),
        }
    }

    pub fn insert(&mut self, value: &Number) {
        match self {
            SeenSet::Exact(set) => {
                if let Some(n) = value.as_int() {
                    set.insert(n.clone());
                }
            }
            SeenSet::Tolerant(values) => values.push(value.to_f64()),
        }
    }

    pub fn contains(&self, value: &Number) -> bool {
        match self {
            SeenSet::Exact(set) => value.as_int().is_some_and(|n| set.contains(n)),
            SeenSet::Tolerant(values) => {
                let v = value.to_f64();
                values
                    .iter()
                    .any(|seen| (v - seen).abs() <= NumericMode::Real.tolerance())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SeenSet::Exact(set) => set.len(),
            SeenSet::Tolerant(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Divergence, convergence and cycle checks for one run
#[derive(Debug, Clone)]
pub struct TerminationDetector {
    mode: NumericMode,
    bounds: Bounds,
    seen: SeenSet,
}

impl TerminationDetector {
    pub fn new(mode: NumericMode, bounds: Bounds, start: &Number) -> Self {
        let mut seen = SeenSet::new(mode);
        seen.insert(start);
        Self { mode, bounds, seen }
    }

    /// Check `current` against the run so far
    ///
    /// Returns `None` and records `current` as seen when generation should
    /// continue.
    pub fn inspect(&mut self, previous: &Number, current: &Number) -> Option<Termination> {
        if let Some((direction, bound)) = self.bounds.violated_by(current) {
            return Some(Termination::Diverged {
                direction,
                bound: bound.clone(),
                value: current.clone(),
            });
        }

        if self.mode.equal(current, previous) {
            return Some(Termination::Converged {
                value: current.clone(),
                previous: previous.clone(),
            });
        }

        if self.seen.contains(current) {
            return Some(Termination::CycleDetected {
                value: current.clone(),
                within_tolerance: self.mode == NumericMode::Real,
            });
        }

        self.seen.insert(current);
        None
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Number {
        Number::from_i64(n)
    }

    fn real(f: f64) -> Number {
        Number::from_f64(f)
    }

    #[test]
    fn test_bounds_violation() {
        let bounds = Bounds::new(Some(int(3)), Some(int(-3)));
        assert_eq!(bounds.violated_by(&int(3)), None);
        assert_eq!(bounds.violated_by(&int(4)), Some((Direction::Upper, &int(3))));
        assert_eq!(bounds.violated_by(&int(-4)), Some((Direction::Lower, &int(-3))));
        assert!(Bounds::default().violated_by(&int(1_000_000)).is_none());
    }

    #[test]
    fn test_divergence_checked_first() {
        // 10 both exceeds the bound and repeats the previous value
        let mut detector = TerminationDetector::new(
            NumericMode::Integer,
            Bounds::new(Some(int(5)), None),
            &int(10),
        );
        let signal = detector.inspect(&int(10), &int(10)).unwrap();
        assert!(matches!(signal, Termination::Diverged { direction: Direction::Upper, .. }));
        assert!(!signal.keeps_value());
    }

    #[test]
    fn test_convergence_before_cycle() {
        let mut detector =
            TerminationDetector::new(NumericMode::Integer, Bounds::default(), &int(5));
        let signal = detector.inspect(&int(5), &int(5)).unwrap();
        assert_eq!(
            signal,
            Termination::Converged {
                value: int(5),
                previous: int(5),
            }
        );
        assert!(signal.keeps_value());
    }

    #[test]
    fn test_cycle_detected() {
        let mut detector =
            TerminationDetector::new(NumericMode::Integer, Bounds::default(), &int(1));
        assert_eq!(detector.inspect(&int(1), &int(-1)), None);
        assert_eq!(detector.seen().len(), 2);
        let signal = detector.inspect(&int(-1), &int(1)).unwrap();
        assert_eq!(
            signal,
            Termination::CycleDetected {
                value: int(1),
                within_tolerance: false,
            }
        );
    }

    #[test]
    fn test_real_tolerance() {
        let mut detector =
            TerminationDetector::new(NumericMode::Real, Bounds::default(), &real(1.0));
        assert_eq!(detector.inspect(&real(1.0), &real(2.0)), None);
        // Within 1e-9 of 1.0 but not bit-identical
        let signal = detector.inspect(&real(2.0), &real(1.0 + 4e-10)).unwrap();
        assert!(matches!(
            signal,
            Termination::CycleDetected { within_tolerance: true, .. }
        ));

        let mut detector =
            TerminationDetector::new(NumericMode::Real, Bounds::default(), &real(0.5));
        let signal = detector.inspect(&real(0.5), &real(0.5 - 9e-10)).unwrap();
        assert!(matches!(signal, Termination::Converged { .. }));
    }

    #[test]
    fn test_real_outside_tolerance_continues() {
        let mut detector =
            TerminationDetector::new(NumericMode::Real, Bounds::default(), &real(1.0));
        assert_eq!(detector.inspect(&real(1.0), &real(1.0 + 1e-6)), None);
    }

    #[test]
    fn test_seen_set_kinds() {
        let mut exact = SeenSet::new(NumericMode::Integer);
        assert!(exact.is_empty());
        exact.insert(&int(7));
        assert!(exact.contains(&int(7)));
        assert!(!exact.contains(&int(8)));

        let mut tolerant = SeenSet::new(NumericMode::Real);
        tolerant.insert(&real(0.3));
        assert!(tolerant.contains(&real(0.1 + 0.2)));
    }

    #[test]
    fn test_advisory_messages() {
        let diverged = Termination::Diverged {
            direction: Direction::Lower,
            bound: int(0),
            value: int(-2),
        };
        assert_eq!(
            diverged.advisory().unwrap(),
            "Divergence detected: -2 exceeded lower bound of 0."
        );
        assert!(Termination::Exhausted.advisory().is_none());

        let converged = Termination::Converged {
            value: real(0.5),
            previous: real(0.5000000001),
        };
        assert_eq!(
            converged.advisory().unwrap(),
            "Convergence detected: Sequence stabilized at 0.5 (previous: 0.5000000001)."
        );

        let exact_cycle = Termination::CycleDetected {
            value: int(1),
            within_tolerance: false,
        };
        assert_eq!(
            exact_cycle.advisory().unwrap(),
            "Cycle detected: Number 1 repeated. Sequence is entering a loop."
        );

        let tolerant_cycle = Termination::CycleDetected {
            value: real(0.1),
            within_tolerance: true,
        };
        assert_eq!(
            tolerant_cycle.advisory().unwrap(),
            "Cycle detected: Number 0.1 repeated (within tolerance). Sequence is entering a loop."
        );
    }
}
