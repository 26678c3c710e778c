use ndarray::Array1;
use rand::Rng;

use crate::bounds::SearchBounds;

/// Parameters of the power-law mutation operator.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MutationParams {
    pub scale: f64,
    pub base: f64,
    pub p_min: i32,
    pub p_max: i32,
    pub max_mut: usize,
}

/// Mutated copy of `ancestor`, wrapped back into `bounds`.
///
/// Applies between 1 and `max_mut` single-coordinate steps. Each step picks a
/// dimension `pos` and adds `scale * span[pos] * base^E * 2 * (U - 0.5)` with
/// `E` uniform in `[p_min, p_max]` and `U` uniform in `[0, 1)`.
pub(crate) fn gen_descendant<R: Rng + ?Sized>(
    ancestor: &Array1<f64>,
    bounds: &SearchBounds,
    params: &MutationParams,
    rng: &mut R,
) -> Array1<f64> {
    let n = bounds.dim();
    let span = bounds.span();
    let mut d = ancestor.clone();
    let n_mut = rng.random_range(1..=params.max_mut);
    for _ in 0..n_mut {
        let pos = rng.random_range(0..n);
        let power = rng.random_range(params.p_min..=params.p_max);
        let u: f64 = rng.random::<f64>();
        d[pos] += params.scale * span[pos] * params.base.powi(power) * 2.0 * (u - 0.5);
    }
    bounds.wrap_in_place(&mut d);
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params() -> MutationParams {
        MutationParams {
            scale: 1.0,
            base: 10.0,
            p_min: -10,
            p_max: 2,
            max_mut: 5,
        }
    }

    #[test]
    fn test_descendant_stays_in_bounds() {
        let bounds = SearchBounds::new(&[(-1.0, 1.0), (0.0, 100.0), (5.0, 6.0)]).unwrap();
        let ancestor = array![0.0, 50.0, 5.5];
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let d = gen_descendant(&ancestor, &bounds, &params(), &mut rng);
            assert!(bounds.contains(&d), "descendant left the box: {d}");
        }
    }

    #[test]
    fn test_ancestor_is_not_modified() {
        let bounds = SearchBounds::new(&[(-1.0, 1.0), (-1.0, 1.0)]).unwrap();
        let ancestor = array![0.25, -0.25];
        let mut rng = StdRng::seed_from_u64(1);
        let _ = gen_descendant(&ancestor, &bounds, &params(), &mut rng);
        assert_eq!(ancestor, array![0.25, -0.25]);
    }

    #[test]
    fn test_at_most_max_mut_coordinates_change() {
        let bounds = SearchBounds::new(&vec![(-1.0, 1.0); 20]).unwrap();
        let ancestor = Array1::zeros(20);
        let p = MutationParams {
            max_mut: 3,
            ..params()
        };
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let d = gen_descendant(&ancestor, &bounds, &p, &mut rng);
            let changed = d.iter().filter(|&&x| x != 0.0).count();
            assert!(changed <= 3);
        }
    }

    #[test]
    fn test_step_magnitude_follows_power_range() {
        // single power 10^-3 on a unit span: every step is below 1e-3
        let bounds = SearchBounds::new(&[(-1.0, 1.0)]).unwrap();
        let p = MutationParams {
            scale: 0.5,
            base: 10.0,
            p_min: -3,
            p_max: -3,
            max_mut: 1,
        };
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let d = gen_descendant(&array![0.0], &bounds, &p, &mut rng);
            assert!(d[0].abs() <= 1e-3);
        }
    }

    #[test]
    fn test_same_seed_same_descendant() {
        let bounds = SearchBounds::new(&[(-3.0, 3.0), (-3.0, 3.0)]).unwrap();
        let ancestor = array![0.5, 0.5];
        let a = gen_descendant(&ancestor, &bounds, &params(), &mut StdRng::seed_from_u64(77));
        let b = gen_descendant(&ancestor, &bounds, &params(), &mut StdRng::seed_from_u64(77));
        assert_eq!(a, b);
    }
}
