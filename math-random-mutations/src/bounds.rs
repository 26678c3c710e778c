//! Box bounds of the search domain and periodic wrapping into them.

use ndarray::{Array1, Zip};

use crate::error::{RMError, Result};

/// Per-dimension `(lower, upper)` bounds with precomputed spans.
///
/// Coordinates leaving the box are folded back periodically (modulo the
/// span) instead of being clamped, so the search space behaves like a torus.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
    span: Array1<f64>,
}

impl SearchBounds {
    /// Builds bounds from `(lower, upper)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `RMError::InvalidConfiguration` if `bounds` is empty and
    /// `RMError::InvalidBounds` if a pair is not finite or has `lower >= upper`
    /// (a zero span makes the wrap undefined).
    pub fn new(bounds: &[(f64, f64)]) -> Result<Self> {
        if bounds.is_empty() {
            return Err(RMError::config("bounds must have at least one dimension"));
        }
        for (index, &(lower, upper)) in bounds.iter().enumerate() {
            if !(lower.is_finite() && upper.is_finite() && lower < upper) {
                return Err(RMError::InvalidBounds {
                    index,
                    lower,
                    upper,
                });
            }
        }
        let lower: Array1<f64> = bounds.iter().map(|b| b.0).collect();
        let upper: Array1<f64> = bounds.iter().map(|b| b.1).collect();
        let span = &upper - &lower;
        Ok(Self { lower, upper, span })
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Lower bounds.
    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// `upper - lower` per dimension.
    pub fn span(&self) -> &Array1<f64> {
        &self.span
    }

    /// Returns a copy of `v` folded into `[lower, upper)`.
    pub fn wrap(&self, v: &Array1<f64>) -> Array1<f64> {
        let mut out = v.clone();
        self.wrap_in_place(&mut out);
        out
    }

    /// Folds `v` into `[lower, upper)` in place using
    /// `((v - lower) mod span) + lower` with a Euclidean modulo.
    pub fn wrap_in_place(&self, v: &mut Array1<f64>) {
        Zip::from(v)
            .and(&self.lower)
            .and(&self.upper)
            .and(&self.span)
            .for_each(|x, &lo, &hi, &s| *x = wrap_scalar(*x, lo, hi, s));
    }

    /// `true` if every coordinate lies in the closed box.
    pub fn contains(&self, v: &Array1<f64>) -> bool {
        v.len() == self.dim()
            && Zip::from(v)
                .and(&self.lower)
                .and(&self.upper)
                .all(|&x, &lo, &hi| x >= lo && x <= hi)
    }

    /// Bounds as `(lower, upper)` pairs.
    pub fn to_pairs(&self) -> Vec<(f64, f64)> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&lo, &hi)| (lo, hi))
            .collect()
    }
}

fn wrap_scalar(x: f64, lo: f64, hi: f64, span: f64) -> f64 {
    let w = (x - lo).rem_euclid(span) + lo;
    // rounding can land exactly on `hi`, which is the same point as `lo`;
    // an infinite offset has no position on the circle and restarts at `lo`
    if !w.is_finite() || w >= hi { lo } else { w }
}

/// `n` copies of `(-radius, radius)`: a symmetric search box.
pub fn default_bounds(n: usize, radius: f64) -> Vec<(f64, f64)> {
    vec![(-radius, radius); n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_wrap_negative_and_over_range() {
        let b = SearchBounds::new(&[(-1.0, 1.0)]).unwrap();
        assert_eq!(b.wrap(&array![-5.0])[0], -1.0);
        assert!((b.wrap(&array![3.5])[0] - (-0.5)).abs() < 1e-12);
        assert!((b.wrap(&array![-1.25])[0] - 0.75).abs() < 1e-12);
        assert_eq!(b.wrap(&array![0.25])[0], 0.25);
    }

    #[test]
    fn test_wrap_upper_bound_maps_to_lower() {
        let b = SearchBounds::new(&[(0.0, 2.0), (-3.0, 7.0)]).unwrap();
        let w = b.wrap(&array![2.0, 7.0]);
        assert_eq!(w, array![0.0, -3.0]);
    }

    #[test]
    fn test_wrap_matches_formula_per_dimension() {
        let b = SearchBounds::new(&[(-2.0, 3.0), (10.0, 11.5), (-0.5, 0.5)]).unwrap();
        let v = array![-17.3, 42.0, 0.49];
        let w = b.wrap(&v);
        for i in 0..3 {
            let lo = b.lower()[i];
            let s = b.span()[i];
            let expected = (v[i] - lo).rem_euclid(s) + lo;
            assert!((w[i] - expected).abs() < 1e-12);
            assert!(w[i] >= lo && w[i] < b.upper()[i]);
        }
    }

    #[test]
    fn test_wrap_tiny_negative_offset_stays_in_box() {
        let b = SearchBounds::new(&[(-1.0, 1.0)]).unwrap();
        let w = b.wrap(&array![-1.0 - f64::EPSILON]);
        assert!(b.contains(&w));
        assert!(w[0] < 1.0);
    }

    #[test]
    fn test_wrap_non_finite_maps_to_lower() {
        let b = SearchBounds::new(&[(-1.0, 1.0), (2.0, 5.0), (0.0, 1.0)]).unwrap();
        let w = b.wrap(&array![f64::INFINITY, f64::NEG_INFINITY, f64::NAN]);
        assert_eq!(w, array![-1.0, 2.0, 0.0]);
        assert!(b.contains(&w));
    }

    #[test]
    fn test_degenerate_and_inverted_bounds_rejected() {
        let err = SearchBounds::new(&[(0.0, 1.0), (2.0, 2.0)]).unwrap_err();
        assert!(matches!(err, RMError::InvalidBounds { index: 1, .. }));

        let err = SearchBounds::new(&[(3.0, -3.0)]).unwrap_err();
        assert!(err.is_bounds_error());

        let err = SearchBounds::new(&[(f64::NEG_INFINITY, 0.0)]).unwrap_err();
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_empty_bounds_is_config_error() {
        let err = SearchBounds::new(&[]).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_default_bounds() {
        assert_eq!(default_bounds(3, 2.5), vec![(-2.5, 2.5); 3]);
        assert!(default_bounds(0, 1.0).is_empty());
    }

    #[test]
    fn test_contains() {
        let b = SearchBounds::new(&default_bounds(2, 1.0)).unwrap();
        assert!(b.contains(&array![1.0, -1.0]));
        assert!(!b.contains(&array![1.01, 0.0]));
        assert!(!b.contains(&array![0.0]));
    }
}
