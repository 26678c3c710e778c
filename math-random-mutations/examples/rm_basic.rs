use math_audio_random_mutations::{OuterStatus, RMConfig, random_mutations};
use ndarray::Array1;
use std::f64::consts::PI;

fn main() {
    // sum of sines: minimum -n at x_i = -pi/2
    let sum_sin = |x: &Array1<f64>| x.iter().map(|&xi| xi.sin()).sum::<f64>();
    let bounds = vec![(-PI, PI); 5];

    let mut cfg = RMConfig::default();
    cfg.seed = Some(42);
    cfg.disp = true;

    // Callback result is shown in the progress table and kept in the trace
    cfg.callback = Some(Box::new(|status: &OuterStatus| {
        format!("{:+.3}", status.best_value + 5.0)
    }));

    let report = random_mutations(&sum_sin, &bounds, cfg).expect("optimization failed");

    println!("Result: {:?}", report);
    println!("Best x: {:?}", report.x);
    println!("Best f: {:.6}", report.fun);
    println!(
        "Distance to -pi/2: {:.2e}",
        report
            .x
            .iter()
            .map(|&xi| (xi + PI / 2.0).abs())
            .fold(0.0f64, f64::max)
    );
    if let Some(last) = report.steps.last() {
        println!(
            "Last callback result: {}",
            last.callback_result.as_deref().unwrap_or("-")
        );
    }
}
