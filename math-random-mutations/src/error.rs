//! Error types for the random mutations optimizer.
//!
//! Library errors are `thiserror` enums with helper methods for
//! categorization. Validation errors are raised before the first objective
//! evaluation; objective failures abort the run without a partial report.

use thiserror::Error;

/// Boxed error returned by a fallible objective function.
pub type ObjectiveError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while configuring or running the optimizer.
#[derive(Debug, Error)]
pub enum RMError {
    /// A bound pair is inverted, degenerate (`lower == upper`) or not finite.
    #[error("invalid bounds at index {index}: lower ({lower}) must be < upper ({upper})")]
    InvalidBounds {
        /// Index of the invalid bound pair
        index: usize,
        /// The lower bound value
        lower: f64,
        /// The upper bound value
        upper: f64,
    },

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Human readable description of the offending option
        reason: String,
    },

    /// Initial guess (x0) has wrong dimension.
    #[error("x0 dimension mismatch: expected {expected}, got {got}")]
    X0DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        got: usize,
    },

    /// The objective function failed; the run was aborted.
    #[error("objective evaluation failed at iteration {iteration}: {source}")]
    ObjectiveEvaluation {
        /// Outer iteration during which the failure happened (0 = never started)
        iteration: usize,
        /// Error returned by the objective
        #[source]
        source: ObjectiveError,
    },

    /// Reading or writing a settings file failed.
    #[error("configuration file error: {0}")]
    Config(#[from] crate::config_file::ConfigError),

    /// Writing a trace failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for random mutations operations.
pub type Result<T> = std::result::Result<T, RMError>;

impl RMError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        RMError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a bounds-related error.
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, RMError::InvalidBounds { .. })
    }

    /// Returns `true` if this is a configuration-related error.
    ///
    /// This includes `InvalidConfiguration`, `X0DimensionMismatch` and
    /// settings-file failures.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RMError::InvalidConfiguration { .. }
                | RMError::X0DimensionMismatch { .. }
                | RMError::Config(_)
        )
    }

    /// Returns `true` if the objective function itself failed.
    pub fn is_objective_error(&self) -> bool {
        matches!(self, RMError::ObjectiveEvaluation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RMError::InvalidBounds {
            index: 2,
            lower: 1.0,
            upper: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "invalid bounds at index 2: lower (1) must be < upper (1)"
        );

        let err = RMError::config("n_pop must be > 0");
        assert_eq!(err.to_string(), "invalid configuration: n_pop must be > 0");
    }

    #[test]
    fn test_is_bounds_error() {
        let bounds_err = RMError::InvalidBounds {
            index: 0,
            lower: 5.0,
            upper: 3.0,
        };
        let config_err = RMError::config("max_iter must be > 0");

        assert!(bounds_err.is_bounds_error());
        assert!(!config_err.is_bounds_error());
    }

    #[test]
    fn test_is_config_error() {
        let dim_err = RMError::X0DimensionMismatch {
            expected: 10,
            got: 5,
        };
        let bounds_err = RMError::InvalidBounds {
            index: 0,
            lower: 5.0,
            upper: 3.0,
        };

        assert!(dim_err.is_config_error());
        assert!(!bounds_err.is_config_error());
    }

    #[test]
    fn test_objective_error_keeps_source() {
        let err = RMError::ObjectiveEvaluation {
            iteration: 3,
            source: "simulation diverged".into(),
        };
        assert!(err.is_objective_error());
        assert_eq!(
            err.to_string(),
            "objective evaluation failed at iteration 3: simulation diverged"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("simulation diverged"));
    }
}
