use clap::{Parser, ValueEnum};
use math_audio_random_mutations::{
    ConsoleObserver, Granularity, LogObserver, NoopObserver, Objective, Observer, ProgressStyle,
    RMReport, RandomMutations, TraceRecorder,
    config_file::{RMSettings, load_settings, save_settings},
    function_registry::{FunctionInfo, FunctionRegistry},
    run_recorded::records_dir,
};
use std::fmt::Write as FmtWrite;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "run_rm",
    about = "Minimize a benchmark function with the random mutations optimizer"
)]
struct Cli {
    /// Name of the benchmark function to optimize (use --list-functions to see available options)
    #[arg(long)]
    function: Option<String>,

    /// Dimensionality of the problem
    #[arg(long, default_value_t = 2)]
    dim: usize,

    /// Settings file (.json or .toml); command line options override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to this file (.json or .toml) and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Population size
    #[arg(long)]
    n_pop: Option<usize>,

    /// Descendants per population member and iteration
    #[arg(long)]
    n_des: Option<usize>,

    /// Smallest mutation power
    #[arg(long, allow_hyphen_values = true)]
    p_min: Option<i32>,

    /// Largest mutation power
    #[arg(long, allow_hyphen_values = true)]
    p_max: Option<i32>,

    /// Maximum number of mutated coordinates per descendant
    #[arg(long)]
    max_mut: Option<usize>,

    /// Stalled iterations before stopping
    #[arg(long)]
    n_stall: Option<usize>,

    /// Improvement below which an iteration counts as stalled
    #[arg(long)]
    eps: Option<f64>,

    /// Maximum number of iterations
    #[arg(long)]
    max_iter: Option<usize>,

    /// Mutation scale
    #[arg(long)]
    scale: Option<f64>,

    /// Base of the mutation power law
    #[arg(long)]
    base: Option<f64>,

    /// Do not let the ancestor compete with its descendants
    #[arg(long)]
    no_ancestor: bool,

    /// Optional random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Progress output
    #[arg(long, value_enum, default_value_t = DisplayChoice::Table)]
    display: DisplayChoice,

    /// Redraw a single line instead of one row per iteration
    #[arg(long)]
    single_line: bool,

    /// Progress column style
    #[arg(long, value_enum, default_value_t = ProgressChoice::Sharps)]
    progress: ProgressChoice,

    /// Enable parallel evaluation
    #[arg(long)]
    parallel: bool,

    /// Unit of parallel work
    #[arg(long, value_enum, default_value_t = GranularityChoice::Slots)]
    granularity: GranularityChoice,

    /// Number of threads for parallel evaluation (0 = use all available cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Save the iteration trace as CSV in the records directory
    #[arg(long)]
    record: bool,

    /// List all available functions and exit
    #[arg(long)]
    list_functions: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DisplayChoice {
    /// Progress table on stderr
    Table,
    /// Per-iteration progress through the logger (set RUST_LOG=info)
    Log,
    /// No progress output
    None,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProgressChoice {
    Sharps,
    Bar,
    Counter,
}

impl From<ProgressChoice> for ProgressStyle {
    fn from(choice: ProgressChoice) -> Self {
        match choice {
            ProgressChoice::Sharps => ProgressStyle::Sharps,
            ProgressChoice::Bar => ProgressStyle::Bar,
            ProgressChoice::Counter => ProgressStyle::Counter,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GranularityChoice {
    Slots,
    Descendants,
}

impl From<GranularityChoice> for Granularity {
    fn from(choice: GranularityChoice) -> Self {
        match choice {
            GranularityChoice::Slots => Granularity::Slots,
            GranularityChoice::Descendants => Granularity::Descendants,
        }
    }
}

fn main() {
    env_logger::init();

    let args = Cli::parse();

    let registry = FunctionRegistry::new();

    if args.list_functions {
        list_available_functions(&registry);
        return;
    }

    let settings = effective_settings(&args);

    if let Some(path) = &args.save_config {
        if let Err(e) = save_settings(&settings, path) {
            eprintln!("Error: cannot write settings to {}: {}", path.display(), e);
            process::exit(2);
        }
        println!("Settings written to {}", path.display());
        return;
    }

    let function_name = match &args.function {
        Some(name) => name.trim(),
        None => {
            eprintln!("Error: --function must be provided unless --list-functions is used.");
            process::exit(2);
        }
    };

    let info = match resolve_function(&registry, function_name) {
        Some(info) => *info,
        None => {
            eprintln!(
                "Error: function '{function_name}' not found. Use --list-functions to inspect available names."
            );
            process::exit(2);
        }
    };

    if args.dim == 0 {
        eprintln!("Error: problem dimension must be greater than zero.");
        process::exit(2);
    }

    let config = settings.to_config().unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        process::exit(2);
    });

    let bounds = info.bounds_for(args.dim);
    let objective = info.func;

    println!(
        "Running random mutations on '{}' ({}D), population={} descendants={}...",
        info.name, args.dim, config.n_pop, config.n_des
    );

    let overall_start = Instant::now();
    let mut rm = match RandomMutations::new(&objective, &bounds) {
        Ok(rm) => rm,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    };
    *rm.config_mut() = config;

    let mut display: Box<dyn Observer> = match args.display {
        DisplayChoice::Table => Box::new(
            ConsoleObserver::stderr()
                .multiline(!args.single_line)
                .style(args.progress.into()),
        ),
        DisplayChoice::Log => Box::new(LogObserver),
        DisplayChoice::None => Box::new(NoopObserver),
    };

    let (report, trace_path) = if args.record {
        let dir = records_dir().unwrap_or_else(|err| {
            eprintln!("Error: {err}");
            process::exit(2);
        });
        let mut recorder = TraceRecorder::with_output_dir(info.name, dir);
        let report = run(&mut rm, &mut (&mut display, &mut recorder));
        match recorder.finalize() {
            Ok(path) => (report, Some(path)),
            Err(e) => {
                eprintln!("Error: cannot write trace: {e}");
                process::exit(2);
            }
        }
    } else {
        (run(&mut rm, &mut display), None)
    };

    let elapsed = overall_start.elapsed();
    println!("\nOptimization completed in {:.2?}", elapsed);
    println!("Status: {}", report.message);
    println!(
        "Iterations: {} | Evaluations: {} | Success: {}",
        report.nit, report.nfev, report.success
    );
    println!(
        "Best objective: {:.6e} (known minimum {:.6e})",
        report.fun,
        info.expected_minimum(args.dim)
    );

    let mut best_vector = String::new();
    for (idx, value) in report.x.iter().enumerate() {
        if idx > 0 {
            best_vector.push_str(", ");
        }
        let _ = write!(&mut best_vector, "{value:.6}");
    }
    println!("Best parameters: [{}]", best_vector);

    if let Some(path) = trace_path {
        println!("Trace saved to {}", path.display());
    }

    if !report.success {
        process::exit(1);
    }
}

fn run<O, Obs>(rm: &mut RandomMutations<'_, O>, observer: &mut Obs) -> RMReport
where
    O: Objective + ?Sized,
    Obs: Observer + ?Sized,
{
    rm.solve_with_observer(observer).unwrap_or_else(|e| {
        eprintln!("Error: optimization failed: {}", e);
        process::exit(2);
    })
}

/// Settings file (or defaults) overridden by command line options.
fn effective_settings(args: &Cli) -> RMSettings {
    let mut settings = match &args.config {
        Some(path) => load_settings(path).unwrap_or_else(|err| {
            eprintln!("Error: cannot read settings from {}: {}", path.display(), err);
            process::exit(2);
        }),
        None => RMSettings::default(),
    };

    if let Some(v) = args.n_pop {
        settings.n_pop = v;
    }
    if let Some(v) = args.n_des {
        settings.n_des = v;
    }
    if let Some(v) = args.p_min {
        settings.p_min = v;
    }
    if let Some(v) = args.p_max {
        settings.p_max = v;
    }
    if let Some(v) = args.max_mut {
        settings.max_mut = v;
    }
    if let Some(v) = args.n_stall {
        settings.n_stall = v;
    }
    if let Some(v) = args.eps {
        settings.eps = v;
    }
    if let Some(v) = args.max_iter {
        settings.max_iter = v;
    }
    if let Some(v) = args.scale {
        settings.scale = v;
    }
    if let Some(v) = args.base {
        settings.base = v;
    }
    if args.no_ancestor {
        settings.include_ancestor = false;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    if args.parallel {
        settings.parallel.enabled = true;
        settings.parallel.granularity = args.granularity.into();
        if args.threads > 0 {
            settings.parallel.num_threads = Some(args.threads);
        }
    }
    // progress goes through the observer chosen with --display
    settings.disp = false;
    settings
}

fn list_available_functions(registry: &FunctionRegistry) {
    let names = registry.list_functions();
    println!("Available test functions ({}):", names.len());
    for name in names {
        if let Some(info) = registry.info(&name) {
            println!(
                "- {name:<16} bounds [{}, {}]",
                info.bounds.0, info.bounds.1
            );
        }
    }
}

fn resolve_function<'r>(registry: &'r FunctionRegistry, requested: &str) -> Option<&'r FunctionInfo> {
    if let Some(info) = registry.info(requested) {
        return Some(info);
    }

    let requested_lower = requested.to_lowercase();
    registry
        .iter()
        .find(|(name, _)| name.to_lowercase() == requested_lower)
        .map(|(_, info)| info)
}
