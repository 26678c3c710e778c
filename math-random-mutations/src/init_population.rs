use ndarray::{Array1, Array2};
use rand::Rng;

use crate::bounds::SearchBounds;

/// Uniform sampling over the whole box.
pub(crate) fn init_random<R: Rng + ?Sized>(
    npop: usize,
    bounds: &SearchBounds,
    rng: &mut R,
) -> Array2<f64> {
    let n = bounds.dim();
    let mut pop = Array2::<f64>::zeros((npop, n));
    for i in 0..npop {
        for j in 0..n {
            let u: f64 = rng.random::<f64>();
            pop[(i, j)] = bounds.lower()[j] + u * bounds.span()[j];
        }
    }
    pop
}

/// Uniform sampling in `[x0 - scale, x0 + scale]`, then wrapped into the box.
pub(crate) fn init_around<R: Rng + ?Sized>(
    npop: usize,
    x0: &Array1<f64>,
    scale: f64,
    bounds: &SearchBounds,
    rng: &mut R,
) -> Array2<f64> {
    let n = bounds.dim();
    let mut pop = Array2::<f64>::zeros((npop, n));
    for mut row in pop.rows_mut() {
        let mut x = Array1::from_shape_fn(n, |j| x0[j] - scale + 2.0 * scale * rng.random::<f64>());
        bounds.wrap_in_place(&mut x);
        row.assign(&x);
    }
    pop
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_init_dimensions_and_bounds() {
        let bounds = SearchBounds::new(&[(0.0, 10.0), (-1.0, 1.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let pop = init_random(20, &bounds, &mut rng);

        assert_eq!(pop.nrows(), 20);
        assert_eq!(pop.ncols(), 2);
        for row in pop.rows() {
            assert!(bounds.contains(&row.to_owned()));
        }
    }

    #[test]
    fn test_init_around_stays_near_x0() {
        let bounds = SearchBounds::new(&[(-10.0, 10.0), (-10.0, 10.0)]).unwrap();
        let x0 = array![1.0, -2.0];
        let mut rng = StdRng::seed_from_u64(7);

        let pop = init_around(50, &x0, 0.5, &bounds, &mut rng);

        for row in pop.rows() {
            assert!((row[0] - 1.0).abs() <= 0.5);
            assert!((row[1] + 2.0).abs() <= 0.5);
        }
    }

    #[test]
    fn test_init_around_wraps_outside_points() {
        let bounds = SearchBounds::new(&[(-1.0, 1.0)]).unwrap();
        let x0 = array![0.9];
        let mut rng = StdRng::seed_from_u64(3);

        let pop = init_around(200, &x0, 0.5, &bounds, &mut rng);

        let mut wrapped = 0;
        for row in pop.rows() {
            let r = row.to_owned();
            assert!(bounds.contains(&r));
            if r[0] < 0.0 {
                wrapped += 1;
                assert!(r[0] <= -1.0 + 0.4 + 1e-12);
            }
        }
        assert!(wrapped > 0, "some samples past the upper bound should wrap");
    }
}
