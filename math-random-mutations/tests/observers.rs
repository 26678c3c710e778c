use math_audio_random_mutations::config_file::{ConfigFormat, parse_settings};
use math_audio_random_mutations::recorder::read_best_values;
use math_audio_random_mutations::{
    ConsoleObserver, LogObserver, RMConfigBuilder, RandomMutations, TraceRecorder,
};
use ndarray::Array1;
use std::time::Duration;

fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi * xi).sum()
}

#[test]
fn test_console_table_rows() {
    let mut rm = RandomMutations::new(&sphere, &[(-1.0, 1.0); 2]).unwrap();
    *rm.config_mut() = RMConfigBuilder::new()
        .n_pop(4)
        .n_des(3)
        .max_iter(5)
        .n_stall(100)
        .seed(1)
        .build()
        .unwrap();

    let mut console = ConsoleObserver::new(Vec::new()).min_interval(Duration::ZERO);
    let report = rm.solve_with_observer(&mut console).unwrap();
    let text = String::from_utf8(console.into_inner()).unwrap();

    assert!(text.contains("Starting random mutations..."));
    let header = text
        .lines()
        .find(|l| l.contains("Iter."))
        .expect("header line");
    assert_eq!(header.matches('|').count(), 5);
    // one finished row per iteration
    let finished_rows = text
        .split('\n')
        .filter(|l| l.contains(&"#".repeat(18)))
        .count();
    assert_eq!(finished_rows, report.nit);
}

#[test]
fn test_trace_recorder_and_log_observer_together() {
    let dir = std::env::temp_dir().join(format!("rm_it_trace_{}", std::process::id()));
    let mut recorder = TraceRecorder::with_output_dir("sphere_it", &dir);
    let mut rm = RandomMutations::new(&sphere, &[(-3.0, 3.0); 3]).unwrap();
    *rm.config_mut() = RMConfigBuilder::new()
        .n_pop(6)
        .max_iter(15)
        .seed(5)
        .build()
        .unwrap();

    let report = rm
        .solve_with_observer(&mut (LogObserver, &mut recorder))
        .unwrap();
    assert_eq!(recorder.steps(), report.steps.as_slice());
    assert_eq!(recorder.dim(), Some(3));

    let path = recorder.finalize().unwrap();
    let values = read_best_values(&path).unwrap();
    let _ = std::fs::remove_dir_all(&dir);
    assert_eq!(values.len(), report.nit);
    for pair in values.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
}

#[test]
fn test_settings_file_drives_a_run() {
    let settings = parse_settings(
        r#"{ "n_pop": 7, "n_des": 4, "max_iter": 9, "n_stall": 50, "seed": 3 }"#,
        ConfigFormat::Json,
    )
    .unwrap();
    let mut rm = RandomMutations::new(&sphere, &[(-1.0, 1.0)]).unwrap();
    *rm.config_mut() = settings.to_config().unwrap();
    let report = rm.solve().unwrap();
    assert_eq!(report.nit, 9);
    assert_eq!(report.nfev, 9 * 7 * 5);
    assert_eq!(report.population.nrows(), 7);
}
