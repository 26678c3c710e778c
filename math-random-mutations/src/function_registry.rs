//! Shared function registry for random mutations benchmarks and the CLI
use ndarray::Array1;
use std::collections::HashMap;
use std::f64::consts::{E, PI};

/// Test function type definition
pub type TestFunction = fn(&Array1<f64>) -> f64;

/// Sum of sines, minimum `-n` at `x_i = -π/2` on `[-π, π]^n`.
pub fn sum_sin(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi.sin()).sum()
}

/// Sphere function, minimum 0 at the origin.
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi * xi).sum()
}

/// Rastrigin function, minimum 0 at the origin.
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    10.0 * n
        + x.iter()
            .map(|&xi| xi * xi - 10.0 * (2.0 * PI * xi).cos())
            .sum::<f64>()
}

/// Ackley function, minimum 0 at the origin.
pub fn ackley(x: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    let sum_sq: f64 = x.iter().map(|&xi| xi.powi(2)).sum();
    let sum_cos: f64 = x.iter().map(|&xi| (2.0 * PI * xi).cos()).sum();
    -20.0 * (-0.2 * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp() + 20.0 + E
}

/// Rosenbrock function, minimum 0 at `(1, ..., 1)`.
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    x.iter()
        .zip(x.iter().skip(1))
        .map(|(&a, &b)| 100.0 * (b - a * a).powi(2) + (1.0 - a).powi(2))
        .sum()
}

/// Griewank function, minimum 0 at the origin.
pub fn griewank(x: &Array1<f64>) -> f64 {
    let sum_squares: f64 = x.iter().map(|&xi| xi.powi(2)).sum();
    let product_cos: f64 = x
        .iter()
        .enumerate()
        .map(|(i, &xi)| (xi / ((i + 1) as f64).sqrt()).cos())
        .product();
    1.0 + sum_squares / 4000.0 - product_cos
}

const STYBLINSKI_TANG_ARGMIN: f64 = -2.903_534_027_771_177;

/// Styblinski-Tang function, minimum about `-39.166 n` at `x_i ≈ -2.9035`.
pub fn styblinski_tang(x: &Array1<f64>) -> f64 {
    0.5 * x
        .iter()
        .map(|&xi| xi.powi(4) - 16.0 * xi.powi(2) + 5.0 * xi)
        .sum::<f64>()
}

/// A registered test function with its usual search box and known minimum.
#[derive(Clone, Copy, Debug)]
pub struct FunctionInfo {
    /// Registry name
    pub name: &'static str,
    /// The function itself
    pub func: TestFunction,
    /// Per-dimension (lower, upper) bounds
    pub bounds: (f64, f64),
    /// Coordinate of the global minimizer (same on every axis)
    pub argmin_coord: f64,
}

impl FunctionInfo {
    /// Bounds for an `n`-dimensional problem.
    pub fn bounds_for(&self, n: usize) -> Vec<(f64, f64)> {
        vec![self.bounds; n]
    }

    /// Known global minimizer in `n` dimensions.
    pub fn expected_optimum(&self, n: usize) -> Vec<f64> {
        vec![self.argmin_coord; n]
    }

    /// Known global minimum in `n` dimensions.
    pub fn expected_minimum(&self, n: usize) -> f64 {
        (self.func)(&Array1::from(self.expected_optimum(n)))
    }
}

/// Function registry mapping names to test functions.
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionInfo>,
}

impl FunctionRegistry {
    /// Creates a new registry with all standard test functions.
    pub fn new() -> Self {
        let entries = [
            FunctionInfo {
                name: "sum_sin",
                func: sum_sin,
                bounds: (-PI, PI),
                argmin_coord: -PI / 2.0,
            },
            FunctionInfo {
                name: "sphere",
                func: sphere,
                bounds: (-5.12, 5.12),
                argmin_coord: 0.0,
            },
            FunctionInfo {
                name: "rastrigin",
                func: rastrigin,
                bounds: (-5.12, 5.12),
                argmin_coord: 0.0,
            },
            FunctionInfo {
                name: "ackley",
                func: ackley,
                bounds: (-32.768, 32.768),
                argmin_coord: 0.0,
            },
            FunctionInfo {
                name: "rosenbrock",
                func: rosenbrock,
                bounds: (-2.048, 2.048),
                argmin_coord: 1.0,
            },
            FunctionInfo {
                name: "griewank",
                func: griewank,
                bounds: (-600.0, 600.0),
                argmin_coord: 0.0,
            },
            FunctionInfo {
                name: "styblinski_tang",
                func: styblinski_tang,
                bounds: (-5.0, 5.0),
                argmin_coord: STYBLINSKI_TANG_ARGMIN,
            },
        ];
        let functions = entries
            .into_iter()
            .map(|info| (info.name.to_string(), info))
            .collect();
        Self { functions }
    }

    /// Gets a test function by name.
    pub fn get(&self, name: &str) -> Option<TestFunction> {
        self.functions.get(name).map(|info| info.func)
    }

    /// Gets a test function with its metadata by name.
    pub fn info(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    /// Lists all available function names, sorted alphabetically.
    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<_> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns an iterator over all (name, info) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FunctionInfo)> {
        self.functions.iter()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a benchmark run.
#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    /// Descriptive name for the benchmark.
    pub name: String,
    /// Name of the test function.
    pub function_name: String,
    /// Problem dimension.
    pub dim: usize,
    /// Tolerance for objective function value comparison.
    pub fun_tolerance: f64,
    /// Maximum iterations for the benchmark.
    pub max_iter: usize,
    /// Population size.
    pub n_pop: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

/// Generate all benchmark configurations
pub fn generate_benchmark_configs() -> Vec<BenchmarkConfig> {
    let bench = |function_name: &str, dim: usize, fun_tolerance: f64, n_pop: usize, seed: u64| {
        BenchmarkConfig {
            name: format!("{function_name}_{dim}d"),
            function_name: function_name.to_string(),
            dim,
            fun_tolerance,
            max_iter: 1000,
            n_pop,
            seed,
        }
    };
    vec![
        bench("sum_sin", 3, 1e-2, 50, 1),
        bench("sum_sin", 10, 1e-2, 50, 2),
        bench("sphere", 5, 1e-6, 30, 3),
        bench("rastrigin", 2, 1e-3, 50, 4),
        bench("ackley", 2, 1e-3, 50, 5),
        bench("rosenbrock", 2, 1e-3, 50, 6),
        bench("griewank", 2, 1e-2, 50, 7),
        bench("styblinski_tang", 3, 1e-2, 50, 8),
    ]
}
