/// Index and value of the smallest element, first occurrence on ties.
///
/// NaN never wins against a number; an all-NaN slice yields index 0.
pub(crate) fn argmin(v: &[f64]) -> (usize, f64) {
    let mut best_i = 0usize;
    let mut best_v = v[0];
    for (i, &val) in v.iter().enumerate().skip(1) {
        if val < best_v || (best_v.is_nan() && !val.is_nan()) {
            best_v = val;
            best_i = i;
        }
    }
    (best_i, best_v)
}
