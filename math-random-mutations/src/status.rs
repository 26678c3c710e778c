//! Progress snapshots emitted by the optimizer.
//!
//! Two kinds of snapshots exist: an [`InnerStatus`] after each population
//! slot has been updated, and an [`OuterStatus`] after each full iteration.
//! Snapshots are plain values; attaching a callback result builds a new one.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot emitted after population slot `slot` has been updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerStatus {
    /// Outer iteration number (starting at 1).
    pub iteration: usize,
    /// Wall-clock time since the start of the run.
    pub elapsed: Duration,
    /// Best value known at the end of the previous iteration.
    pub best_value: f64,
    /// Current stall counter.
    pub stall: usize,
    /// Stall counter value that stops the run.
    pub n_stall: usize,
    /// Objective evaluations so far.
    pub fevals: usize,
    /// Index of the slot just updated.
    pub slot: usize,
    /// Number of population slots.
    pub n_slots: usize,
}

/// Snapshot emitted once per iteration after the convergence check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OuterStatus {
    /// Outer iteration number (starting at 1).
    pub iteration: usize,
    /// Wall-clock time since the start of the run.
    pub elapsed: Duration,
    /// Best value over the population after this iteration.
    pub best_value: f64,
    /// Stall counter after this iteration.
    pub stall: usize,
    /// Stall counter value that stops the run.
    pub n_stall: usize,
    /// Objective evaluations so far.
    pub fevals: usize,
    /// Value returned by the user callback for this iteration, if any.
    pub callback_result: Option<String>,
}

impl OuterStatus {
    /// Returns a copy of this snapshot carrying `result`.
    pub fn with_callback_result(&self, result: impl Into<String>) -> Self {
        Self {
            callback_result: Some(result.into()),
            ..self.clone()
        }
    }

    /// `true` once the stall counter reached its threshold.
    pub fn is_stalled(&self) -> bool {
        self.stall >= self.n_stall
    }
}

/// Either kind of snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RMStatus {
    /// Per-slot update.
    Inner(InnerStatus),
    /// Per-iteration update.
    Outer(OuterStatus),
}

impl RMStatus {
    /// Iteration number of the snapshot.
    pub fn iteration(&self) -> usize {
        match self {
            RMStatus::Inner(s) => s.iteration,
            RMStatus::Outer(s) => s.iteration,
        }
    }

    /// Elapsed time of the snapshot.
    pub fn elapsed(&self) -> Duration {
        match self {
            RMStatus::Inner(s) => s.elapsed,
            RMStatus::Outer(s) => s.elapsed,
        }
    }

    /// Evaluation count of the snapshot.
    pub fn fevals(&self) -> usize {
        match self {
            RMStatus::Inner(s) => s.fevals,
            RMStatus::Outer(s) => s.fevals,
        }
    }
}

impl From<InnerStatus> for RMStatus {
    fn from(s: InnerStatus) -> Self {
        RMStatus::Inner(s)
    }
}

impl From<OuterStatus> for RMStatus {
    fn from(s: OuterStatus) -> Self {
        RMStatus::Outer(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outer() -> OuterStatus {
        OuterStatus {
            iteration: 4,
            elapsed: Duration::from_millis(12),
            best_value: -2.5,
            stall: 1,
            n_stall: 10,
            fevals: 2200,
            callback_result: None,
        }
    }

    #[test]
    fn test_with_callback_result_builds_new_snapshot() {
        let base = outer();
        let with_cb = base.with_callback_result("ok");
        assert_eq!(base.callback_result, None);
        assert_eq!(with_cb.callback_result.as_deref(), Some("ok"));
        assert_eq!(with_cb.fevals, base.fevals);
        assert_eq!(with_cb.iteration, base.iteration);
    }

    #[test]
    fn test_status_accessors() {
        let s: RMStatus = outer().into();
        assert_eq!(s.iteration(), 4);
        assert_eq!(s.fevals(), 2200);
        assert_eq!(s.elapsed(), Duration::from_millis(12));
    }

    #[test]
    fn test_outer_status_json_round_trip() {
        let s = outer().with_callback_result("cb");
        let json = serde_json::to_string(&s).unwrap();
        let back: OuterStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
