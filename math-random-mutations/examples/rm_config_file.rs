use math_audio_random_mutations::config_file::{
    ConfigFormat, RMSettings, parse_settings, serialize_settings,
};
use math_audio_random_mutations::{ConsoleObserver, ProgressStyle, RandomMutations};
use ndarray::Array1;

const SETTINGS: &str = r#"
n_pop = 20
n_des = 8
p_min = -8
p_max = 1
max_iter = 300
seed = 7
"#;

fn main() {
    let settings: RMSettings =
        parse_settings(SETTINGS, ConfigFormat::Toml).expect("invalid settings");
    println!(
        "Effective settings as JSON:\n{}",
        serialize_settings(&settings, ConfigFormat::Json).expect("serialization failed")
    );

    let griewank = |x: &Array1<f64>| {
        let sum_sq: f64 = x.iter().map(|&xi| xi * xi).sum();
        let prod: f64 = x
            .iter()
            .enumerate()
            .map(|(i, &xi)| (xi / ((i + 1) as f64).sqrt()).cos())
            .product();
        1.0 + sum_sq / 4000.0 - prod
    };

    let mut rm = RandomMutations::new(&griewank, &[(-600.0, 600.0); 3]).expect("invalid bounds");
    *rm.config_mut() = settings.to_config().expect("invalid configuration");

    let mut console = ConsoleObserver::stderr()
        .multiline(false)
        .style(ProgressStyle::Bar);
    let report = rm
        .solve_with_observer(&mut console)
        .expect("optimization failed");

    println!("{}", report.message);
    println!("Best f: {:.6e} at {:?}", report.fun, report.x);
}
