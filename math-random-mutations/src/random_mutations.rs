use crate::objective::Objective;
use crate::{RMConfig, RMReport, RandomMutations, Result};

/// Runs a random mutations optimization on a function.
///
/// This is a convenience function: it creates a [`RandomMutations`] optimizer
/// over `bounds`, installs `config` and runs it to completion.
///
/// # Arguments
///
/// * `objective` - The function to minimize; any `Fn(&Array1<f64>) -> f64 + Sync`
///   closure, or a [`Fallible`](crate::Fallible) wrapper
/// * `bounds` - (lower, upper) pairs, one per dimension
/// * `config` - Optimizer configuration (use `RMConfigBuilder` to construct)
///
/// # Errors
///
/// Returns `RMError::InvalidBounds` if a pair has `lower >= upper`,
/// `RMError::InvalidConfiguration` / `RMError::X0DimensionMismatch` for a bad
/// configuration and `RMError::ObjectiveEvaluation` if the objective fails.
///
/// # Example
///
/// ```rust
/// use math_audio_random_mutations::{random_mutations, RMConfigBuilder};
///
/// let result = random_mutations(
///     &|x: &ndarray::Array1<f64>| x[0].powi(2) + x[1].powi(2),
///     &[(-5.0, 5.0), (-5.0, 5.0)],
///     RMConfigBuilder::new().max_iter(50).seed(42).build().unwrap(),
/// ).expect("optimization failed");
///
/// assert!(result.fun < 0.01);
/// ```
pub fn random_mutations<O>(objective: &O, bounds: &[(f64, f64)], config: RMConfig) -> Result<RMReport>
where
    O: Objective + ?Sized,
{
    let mut rm = RandomMutations::new(objective, bounds)?;
    *rm.config_mut() = config;
    rm.solve()
}
