use math_audio_random_mutations::function_registry::{FunctionRegistry, sum_sin};
use math_audio_random_mutations::{RMConfigBuilder, Termination, random_mutations};
use std::f64::consts::PI;

fn check_sum_sin(n: usize, seed: u64) {
    let bounds = vec![(-PI, PI); n];
    let config = RMConfigBuilder::new().seed(seed).build().unwrap();
    let report = random_mutations(&sum_sin, &bounds, config).unwrap();

    assert_eq!(report.termination, Termination::Converged, "n={n}");
    assert!(
        (report.fun + n as f64).abs() < 1e-2,
        "n={n}: f={} should round to {}",
        report.fun,
        -(n as f64)
    );
    for &xi in report.x.iter() {
        assert!(
            (xi + PI / 2.0).abs() < 5e-2,
            "n={n}: coordinate {xi} should be close to -pi/2"
        );
    }
}

#[test]
fn test_sum_sin_3d() {
    check_sum_sin(3, 2024);
}

#[test]
fn test_sum_sin_5d() {
    check_sum_sin(5, 2025);
}

#[test]
fn test_sum_sin_10d() {
    check_sum_sin(10, 2026);
}

#[test]
fn test_registry_entry_matches() {
    let registry = FunctionRegistry::new();
    let info = registry.info("sum_sin").unwrap();
    assert_eq!(info.bounds_for(3), vec![(-PI, PI); 3]);
    assert!((info.expected_minimum(3) + 3.0).abs() < 1e-12);
}
