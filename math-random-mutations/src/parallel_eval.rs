use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ObjectiveError;
use crate::objective::Objective;

/// What is fanned out to the rayon pool when parallel evaluation is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Whole population slots (mutation + evaluation + selection) run in parallel.
    #[default]
    Slots,
    /// Descendants of one slot are evaluated in parallel; slots stay sequential.
    Descendants,
}

/// Parallel evaluation configuration
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    /// Enable parallel evaluation
    pub enabled: bool,
    /// Unit of parallel work
    pub granularity: Granularity,
    /// Number of threads to use (None = use rayon default)
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub(crate) fn parallel_slots(&self) -> bool {
        self.enabled && self.granularity == Granularity::Slots
    }

    pub(crate) fn parallel_descendants(&self) -> bool {
        self.enabled && self.granularity == Granularity::Descendants
    }

    /// Configures the global rayon pool once; later calls are no-ops.
    pub(crate) fn install_thread_pool(&self) {
        if self.enabled
            && let Some(n) = self.num_threads
        {
            // Ignore error if global pool already set
            let _ = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build_global();
        }
    }
}

/// Evaluates `candidates` in order, stopping at the first failure.
///
/// With `parallel` the evaluations run on the rayon pool; values are still
/// returned in candidate order.
pub(crate) fn evaluate_candidates<O: Objective + ?Sized>(
    candidates: &[Array1<f64>],
    objective: &O,
    parallel: bool,
) -> Result<Vec<f64>, ObjectiveError> {
    if !parallel || candidates.len() < 4 {
        return candidates.iter().map(|c| objective.evaluate(c)).collect();
    }
    candidates
        .par_iter()
        .map(|c| objective.evaluate(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Fallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candidates() -> Vec<Array1<f64>> {
        (0..10)
            .map(|i| Array1::from(vec![i as f64 * 0.1, i as f64 * 0.01]))
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sphere = |x: &Array1<f64>| x.iter().map(|&v| v * v).sum::<f64>();
        let c = candidates();
        let seq = evaluate_candidates(&c, &sphere, false).unwrap();
        let par = evaluate_candidates(&c, &sphere, true).unwrap();
        assert_eq!(seq, par);
        for (x, f) in c.iter().zip(seq.iter()) {
            assert_eq!(*f, x.iter().map(|&v| v * v).sum::<f64>());
        }
    }

    #[test]
    fn test_sequential_stops_at_first_error() {
        let calls = AtomicUsize::new(0);
        let f = Fallible(|x: &Array1<f64>| {
            calls.fetch_add(1, Ordering::SeqCst);
            if x[0] > 0.25 { Err("too far") } else { Ok(x[0]) }
        });
        let err = evaluate_candidates(&candidates(), &f, false).unwrap_err();
        assert_eq!(err.to_string(), "too far");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_parallel_reports_error() {
        let f = Fallible(|x: &Array1<f64>| {
            if x[0] > 0.55 { Err("too far") } else { Ok(x[0]) }
        });
        assert!(evaluate_candidates(&candidates(), &f, true).is_err());
    }

    #[test]
    fn test_default_is_sequential() {
        let cfg = ParallelConfig::default();
        assert!(!cfg.parallel_slots());
        assert!(!cfg.parallel_descendants());
    }
}
