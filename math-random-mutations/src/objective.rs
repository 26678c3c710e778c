use ndarray::Array1;

use crate::error::ObjectiveError;

/// Function to minimize.
///
/// Implemented for every `Fn(&Array1<f64>) -> f64 + Sync` closure. Wrap a
/// closure returning `Result` in [`Fallible`] to abort the run on the first
/// error instead of panicking.
pub trait Objective: Sync {
    /// Objective value at `x`.
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64, ObjectiveError>;
}

impl<F> Objective for F
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64, ObjectiveError> {
        Ok(self(x))
    }
}

/// Adapter for objectives that can fail.
///
/// # Example
///
/// ```rust
/// use math_audio_random_mutations::{Fallible, RMConfigBuilder, random_mutations};
/// use ndarray::Array1;
///
/// let objective = Fallible(|x: &Array1<f64>| -> Result<f64, String> {
///     if x.iter().any(|v| v.is_nan()) {
///         return Err("NaN input".to_string());
///     }
///     Ok(x.iter().map(|v| v * v).sum())
/// });
/// let config = RMConfigBuilder::new().max_iter(5).seed(1).build().unwrap();
/// let report = random_mutations(&objective, &[(-1.0, 1.0)], config).unwrap();
/// assert!(report.fun >= 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fallible<F>(pub F);

impl<F, E> Objective for Fallible<F>
where
    F: Fn(&Array1<f64>) -> Result<f64, E> + Sync,
    E: Into<ObjectiveError>,
{
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64, ObjectiveError> {
        (self.0)(x).map_err(Into::into)
    }
}
