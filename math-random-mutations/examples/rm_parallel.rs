use math_audio_random_mutations::{
    Granularity, ParallelConfig, RMConfigBuilder, random_mutations,
};
use ndarray::Array1;
use std::time::Instant;

fn main() {
    // Rastrigin function with artificial compute delay to simulate expensive evaluations
    let dimension = 10;
    let rastrigin = move |x: &Array1<f64>| -> f64 {
        let mut sum = 0.0;
        for _ in 0..1000 {
            for &xi in x.iter() {
                sum += xi.sin().cos().exp().ln_1p();
            }
        }

        let a = 10.0;
        let n = x.len() as f64;
        let result = a * n
            + x.iter()
                .map(|&xi| xi * xi - a * (2.0 * std::f64::consts::PI * xi).cos())
                .sum::<f64>();
        result + sum * 1e-10
    };

    let bounds: Vec<(f64, f64)> = vec![(-5.12, 5.12); dimension];

    let runs = [
        ("Sequential", ParallelConfig::default()),
        (
            "Parallel (slots)",
            ParallelConfig {
                enabled: true,
                granularity: Granularity::Slots,
                num_threads: None,
            },
        ),
        (
            "Parallel (descendants)",
            ParallelConfig {
                enabled: true,
                granularity: Granularity::Descendants,
                num_threads: None,
            },
        ),
    ];

    let mut results = Vec::new();
    for (label, parallel) in runs {
        println!("Testing {label} evaluation:");
        let cfg = RMConfigBuilder::new()
            .n_pop(30)
            .max_iter(100)
            .seed(42)
            .parallel(parallel)
            .build()
            .expect("invalid config");

        let start = Instant::now();
        let report = random_mutations(&rastrigin, &bounds, cfg).expect("optimization failed");
        let duration = start.elapsed();

        println!("  Success: {}", report.success);
        println!("  Best f: {:.6e}", report.fun);
        println!("  Iterations: {}", report.nit);
        println!("  Function evaluations: {}", report.nfev);
        println!("  Time: {:.3} seconds\n", duration.as_secs_f64());
        results.push((label, report.fun, duration));
    }

    // a fixed seed gives the same answer whatever the granularity
    let reference = results[0].1;
    for (label, fun, duration) in &results {
        println!(
            "{label:<24} f={fun:.6e} same={} speedup={:.2}x",
            *fun == reference,
            results[0].2.as_secs_f64() / duration.as_secs_f64()
        );
    }
}
