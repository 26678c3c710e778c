use clap::{Arg, Command};
use math_audio_random_mutations::function_registry::{
    BenchmarkConfig, FunctionRegistry, generate_benchmark_configs,
};
use math_audio_random_mutations::{RMConfigBuilder, run_recorded_random_mutations};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct BenchmarkResult {
    name: String,
    success: bool,
    fun_error: f64,
    fun_tolerance: f64,
    nit: usize,
    nfev: usize,
    duration: Duration,
    error_message: Option<String>,
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "✅ PASS" } else { "❌ FAIL" };
        write!(
            f,
            "{} {} (|f - f*|: {:.6e} < {:.2e}, nit: {}, nfev: {}, time: {:.2}s)",
            status,
            self.name,
            self.fun_error,
            self.fun_tolerance,
            self.nit,
            self.nfev,
            self.duration.as_secs_f64()
        )?;
        if let Some(ref err) = self.error_message {
            write!(f, " - {}", err)?;
        }
        Ok(())
    }
}

/// Run a benchmark and compare the result with the known minimum
fn run_benchmark(registry: &FunctionRegistry, bench: &BenchmarkConfig) -> BenchmarkResult {
    let failed = |message: String| BenchmarkResult {
        name: bench.name.clone(),
        success: false,
        fun_error: f64::INFINITY,
        fun_tolerance: bench.fun_tolerance,
        nit: 0,
        nfev: 0,
        duration: Duration::ZERO,
        error_message: Some(message),
    };

    let Some(info) = registry.info(&bench.function_name) else {
        return failed(format!(
            "Function {} not found in registry",
            bench.function_name
        ));
    };
    let config = match RMConfigBuilder::new()
        .n_pop(bench.n_pop)
        .max_iter(bench.max_iter)
        .seed(bench.seed)
        .build()
    {
        Ok(config) => config,
        Err(e) => return failed(e.to_string()),
    };

    let bounds = info.bounds_for(bench.dim);
    let start_time = Instant::now();
    let result = run_recorded_random_mutations(&bench.name, &info.func, &bounds, config);
    let duration = start_time.elapsed();

    match result {
        Ok((report, _csv_path)) => {
            let fun_error = (report.fun - info.expected_minimum(bench.dim)).abs();
            let success = fun_error < bench.fun_tolerance;
            BenchmarkResult {
                name: bench.name.clone(),
                success,
                fun_error,
                fun_tolerance: bench.fun_tolerance,
                nit: report.nit,
                nfev: report.nfev,
                duration,
                error_message: (!success).then(|| {
                    format!(
                        "f = {:.6e}, error {:.6e} >= {:.2e}",
                        report.fun, fun_error, bench.fun_tolerance
                    )
                }),
            }
        }
        Err(e) => BenchmarkResult {
            duration,
            ..failed(format!("Optimization failed: {}", e))
        },
    }
}

fn main() {
    let matches = Command::new("benchmark_convergence")
        .version("0.1.0")
        .about("Runs random mutations convergence benchmarks and reports success/failure")
        .arg(
            Arg::new("filter")
                .short('f')
                .long("filter")
                .value_name("PATTERN")
                .help("Only run benchmarks matching this pattern")
                .num_args(1),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List available benchmarks")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show detailed results for each benchmark")
                .action(clap::ArgAction::SetTrue),
        )
        // cargo bench passes --bench
        .arg(
            Arg::new("bench")
                .long("bench")
                .hide(true)
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let registry = FunctionRegistry::new();
    let benchmarks = generate_benchmark_configs();

    if matches.get_flag("list") {
        println!("Available benchmarks:");
        for bench in &benchmarks {
            println!("  {}", bench.name);
        }
        return;
    }

    let filter = matches.get_one::<String>("filter");
    let verbose = matches.get_flag("verbose");

    let selected: Vec<&BenchmarkConfig> = benchmarks
        .iter()
        .filter(|b| filter.is_none_or(|pattern| b.name.contains(pattern.as_str())))
        .collect();

    if selected.is_empty() {
        eprintln!("No benchmarks match the filter criteria");
        std::process::exit(1);
    }

    println!("Running {} benchmark(s)...", selected.len());

    let mut results = Vec::new();
    let total_start = Instant::now();

    for bench in selected {
        println!("Running {}...", bench.name);
        let result = run_benchmark(&registry, bench);

        if verbose {
            println!("  {}", result);
        } else if result.success {
            println!("  ✅ PASS");
        } else {
            println!(
                "  ❌ FAIL - {}",
                result.error_message.as_deref().unwrap_or("Unknown error")
            );
        }

        results.push(result);
    }

    let total_duration = total_start.elapsed();

    println!("\n=== BENCHMARK SUMMARY ===");
    let passed = results.iter().filter(|r| r.success).count();
    let failed = results.len() - passed;

    println!("Passed: {} / {}", passed, results.len());
    println!("Failed: {}", failed);
    println!("Total time: {:.2}s", total_duration.as_secs_f64());

    if verbose || failed > 0 {
        println!("\nDetailed results:");
        for result in &results {
            println!("  {}", result);
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}
