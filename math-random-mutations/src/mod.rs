//! Random Mutations optimization library.
//!
//! This crate provides a population-based stochastic optimizer for continuous
//! problems over box bounds. Every member of the population is an independent
//! search line: at each iteration it spawns mutated descendants, and the best
//! of them (optionally competing with the unmutated ancestor) replaces it.
//! Mutation steps follow a power law, so both large jumps and fine local moves
//! are tried all the time. Coordinates leaving the box wrap around
//! periodically.
//!
//! # Features
//!
//! - Power-law mutations with configurable magnitude range
//! - Periodic (toroidal) handling of box bounds
//! - Stall-based convergence detection
//! - Per-iteration callback and pluggable progress observers
//! - Optional parallel evaluation, reproducible under a fixed seed
//! - JSON/TOML settings files
//!
//! # Example
//!
//! ```rust
//! use math_audio_random_mutations::{random_mutations, RMConfigBuilder};
//!
//! // Minimize the sphere function: f(x) = sum(x_i^2)
//! let bounds = vec![(-5.0, 5.0), (-5.0, 5.0)];
//! let config = RMConfigBuilder::new()
//!     .n_pop(20)
//!     .max_iter(200)
//!     .seed(42)
//!     .build()
//!     .expect("invalid config");
//!
//! let result = random_mutations(
//!     &|x: &ndarray::Array1<f64>| x.iter().map(|&xi| xi * xi).sum::<f64>(),
//!     &bounds,
//!     config,
//! ).expect("optimization should succeed");
//!
//! assert!(result.fun < 1e-3);
//! ```
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod error;
pub use error::{ObjectiveError, RMError, Result};

use std::fmt;
use std::time::Instant;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Argmin helper with first-occurrence tie breaking.
mod argmin;
/// Search-box bounds and periodic wrapping.
pub mod bounds;
/// Initial population sampling.
mod init_population;
/// Power-law mutation operator.
mod mutation;
/// Objective function abstraction.
pub mod objective;

/// JSON/TOML settings files.
pub mod config_file;
/// Registry of standard test functions for benchmarking.
pub mod function_registry;
/// Progress observers.
pub mod observer;
/// Parallel evaluation support.
pub mod parallel_eval;
/// Trace recording to CSV.
pub mod recorder;
/// Convenience entry point.
pub mod random_mutations;
/// Recorded optimization wrapper.
pub mod run_recorded;
/// Progress snapshots.
pub mod status;


pub use bounds::{SearchBounds, default_bounds};
pub use objective::{Fallible, Objective};
pub use observer::{ConsoleObserver, LogObserver, NoopObserver, Observer, ProgressStyle, RunInfo};
pub use parallel_eval::{Granularity, ParallelConfig};
pub use random_mutations::random_mutations;
pub use recorder::TraceRecorder;
pub use run_recorded::run_recorded_random_mutations;
pub use status::{InnerStatus, OuterStatus, RMStatus};

use argmin::argmin;
use init_population::{init_around, init_random};
use mutation::{MutationParams, gen_descendant};
use parallel_eval::evaluate_candidates;

/// Callback invoked after each iteration; its return value is stored in the trace.
pub type CallbackFn = Box<dyn FnMut(&OuterStatus) -> String>;

/// Configuration for the random mutations optimizer.
///
/// Every option has a default; see [`RMConfigBuilder`] for a fluent way to
/// change them.
pub struct RMConfig {
    /// Optional initial guess; the population starts in `x0 ± scale`.
    pub x0: Option<Array1<f64>>,
    /// Mutation magnitude multiplier and initial spread around `x0`.
    pub scale: f64,
    /// Population size (number of independent search lines).
    pub n_pop: usize,
    /// Descendants generated per population member and iteration.
    pub n_des: usize,
    /// Largest mutation power.
    pub p_max: i32,
    /// Smallest mutation power.
    pub p_min: i32,
    /// Maximum number of mutated coordinates per descendant.
    pub max_mut: usize,
    /// Consecutive stalled iterations before stopping.
    pub n_stall: usize,
    /// Improvement below which an iteration counts as stalled.
    pub eps: f64,
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Let the ancestor compete with its descendants (monotone best values).
    pub include_ancestor: bool,
    /// Base of the mutation power law.
    pub base: f64,
    /// Optional per-iteration callback.
    pub callback: Option<CallbackFn>,
    /// Optional random seed for reproducibility.
    pub seed: Option<u64>,
    /// Render a progress table on stderr when solving without an observer.
    pub disp: bool,
    /// Multiline (one row per iteration) or single-line progress table.
    pub disp_multiline: bool,
    /// Parallel evaluation configuration.
    pub parallel: ParallelConfig,
}

impl Default for RMConfig {
    fn default() -> Self {
        Self {
            x0: None,
            scale: 1.0,
            n_pop: 50,
            n_des: 10,
            p_max: 2,
            p_min: -10,
            max_mut: 5,
            n_stall: 10,
            eps: 1e-6,
            max_iter: 1000,
            include_ancestor: true,
            base: 10.0,
            callback: None,
            seed: None,
            disp: false,
            disp_multiline: true,
            parallel: ParallelConfig::default(),
        }
    }
}

impl fmt::Debug for RMConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RMConfig")
            .field("x0", &self.x0.as_ref().map(|x| format!("len={}", x.len())))
            .field("scale", &self.scale)
            .field("n_pop", &self.n_pop)
            .field("n_des", &self.n_des)
            .field("p_max", &self.p_max)
            .field("p_min", &self.p_min)
            .field("max_mut", &self.max_mut)
            .field("n_stall", &self.n_stall)
            .field("eps", &self.eps)
            .field("max_iter", &self.max_iter)
            .field("include_ancestor", &self.include_ancestor)
            .field("base", &self.base)
            .field("callback", &self.callback.is_some())
            .field("seed", &self.seed)
            .field("disp", &self.disp)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl RMConfig {
    /// Checks every numeric option.
    ///
    /// # Errors
    ///
    /// Returns `RMError::InvalidConfiguration` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("n_pop", self.n_pop),
            ("n_des", self.n_des),
            ("max_mut", self.max_mut),
            ("n_stall", self.n_stall),
            ("max_iter", self.max_iter),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(RMError::config(format!("{name} must be > 0")));
            }
        }
        if self.p_min > self.p_max {
            return Err(RMError::config(format!(
                "p_min ({}) must be <= p_max ({})",
                self.p_min, self.p_max
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(RMError::config(format!(
                "scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        if !(self.base.is_finite() && self.base > 0.0) {
            return Err(RMError::config(format!(
                "base must be finite and > 0, got {}",
                self.base
            )));
        }
        if !self.largest_power().is_finite() {
            return Err(RMError::config(format!(
                "base^p overflows for base {} and powers [{}, {}]",
                self.base, self.p_min, self.p_max
            )));
        }
        if !(self.eps >= 0.0) {
            return Err(RMError::config(format!("eps must be >= 0, got {}", self.eps)));
        }
        if let Some(x0) = &self.x0
            && x0.iter().any(|v| !v.is_finite())
        {
            return Err(RMError::config("x0 must only contain finite values"));
        }
        Ok(())
    }

    /// `base^p` for whichever end of `[p_min, p_max]` gives the larger factor.
    fn largest_power(&self) -> f64 {
        self.base.powi(self.p_max).max(self.base.powi(self.p_min))
    }

    /// Rejects a mutation step `2 * max_mut * scale * span * base^p` that is not
    /// representable for these bounds.
    fn check_step_size(&self, bounds: &SearchBounds) -> Result<()> {
        let max_span = bounds.span().iter().fold(0.0_f64, |acc, &s| acc.max(s));
        let step = 2.0 * self.max_mut as f64 * self.scale * max_span * self.largest_power();
        if step.is_finite() {
            Ok(())
        } else {
            Err(RMError::config(format!(
                "mutation step overflows: scale {} x span {} x base^p with base {} and powers [{}, {}]",
                self.scale, max_span, self.base, self.p_min, self.p_max
            )))
        }
    }

    fn mutation_params(&self) -> MutationParams {
        MutationParams {
            scale: self.scale,
            base: self.base,
            p_min: self.p_min,
            p_max: self.p_max,
            max_mut: self.max_mut,
        }
    }

    /// Objective evaluations performed per iteration.
    pub fn evals_per_iteration(&self) -> usize {
        self.n_pop * (self.n_des + usize::from(self.include_ancestor))
    }
}

/// Fluent builder for `RMConfig` for ergonomic configuration.
///
/// # Example
///
/// ```rust
/// use math_audio_random_mutations::RMConfigBuilder;
///
/// let config = RMConfigBuilder::new()
///     .n_pop(30)
///     .n_des(8)
///     .powers(-8, 1)
///     .max_iter(500)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.evals_per_iteration(), 30 * 9);
/// ```
pub struct RMConfigBuilder {
    cfg: RMConfig,
}

impl Default for RMConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RMConfigBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            cfg: RMConfig::default(),
        }
    }
    /// Sets an initial guess to seed the population.
    pub fn x0(mut self, v: Array1<f64>) -> Self {
        self.cfg.x0 = Some(v);
        self
    }
    /// Sets the mutation scale.
    pub fn scale(mut self, v: f64) -> Self {
        self.cfg.scale = v;
        self
    }
    /// Sets the population size.
    pub fn n_pop(mut self, v: usize) -> Self {
        self.cfg.n_pop = v;
        self
    }
    /// Sets the number of descendants per population member.
    pub fn n_des(mut self, v: usize) -> Self {
        self.cfg.n_des = v;
        self
    }
    /// Sets the largest mutation power.
    pub fn p_max(mut self, v: i32) -> Self {
        self.cfg.p_max = v;
        self
    }
    /// Sets the smallest mutation power.
    pub fn p_min(mut self, v: i32) -> Self {
        self.cfg.p_min = v;
        self
    }
    /// Sets both mutation powers.
    pub fn powers(mut self, p_min: i32, p_max: i32) -> Self {
        self.cfg.p_min = p_min;
        self.cfg.p_max = p_max;
        self
    }
    /// Sets the maximum number of mutations per descendant.
    pub fn max_mut(mut self, v: usize) -> Self {
        self.cfg.max_mut = v;
        self
    }
    /// Sets the number of stalled iterations that stops the run.
    pub fn n_stall(mut self, v: usize) -> Self {
        self.cfg.n_stall = v;
        self
    }
    /// Sets the stall threshold.
    pub fn eps(mut self, v: f64) -> Self {
        self.cfg.eps = v;
        self
    }
    /// Sets the maximum number of iterations.
    pub fn max_iter(mut self, v: usize) -> Self {
        self.cfg.max_iter = v;
        self
    }
    /// Lets the ancestor compete with its descendants.
    pub fn include_ancestor(mut self, v: bool) -> Self {
        self.cfg.include_ancestor = v;
        self
    }
    /// Sets the base of the mutation power law.
    pub fn base(mut self, v: f64) -> Self {
        self.cfg.base = v;
        self
    }
    /// Sets the random seed for reproducibility.
    pub fn seed(mut self, v: u64) -> Self {
        self.cfg.seed = Some(v);
        self
    }
    /// Enables/disables the stderr progress table.
    pub fn disp(mut self, v: bool) -> Self {
        self.cfg.disp = v;
        self
    }
    /// Multiline or single-line progress table.
    pub fn disp_multiline(mut self, v: bool) -> Self {
        self.cfg.disp_multiline = v;
        self
    }
    /// Sets a per-iteration callback function.
    pub fn callback(mut self, cb: Box<dyn FnMut(&OuterStatus) -> String>) -> Self {
        self.cfg.callback = Some(cb);
        self
    }
    /// Sets the parallel evaluation configuration.
    pub fn parallel(mut self, parallel: ParallelConfig) -> Self {
        self.cfg.parallel = parallel;
        self
    }
    /// Enables/disables parallel evaluation.
    pub fn enable_parallel(mut self, enable: bool) -> Self {
        self.cfg.parallel.enabled = enable;
        self
    }
    /// Sets the unit of parallel work.
    pub fn parallel_granularity(mut self, granularity: Granularity) -> Self {
        self.cfg.parallel.granularity = granularity;
        self
    }
    /// Sets the number of parallel threads.
    pub fn parallel_threads(mut self, num_threads: usize) -> Self {
        self.cfg.parallel.num_threads = Some(num_threads);
        self
    }
    /// Builds and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `RMError::InvalidConfiguration` if an option is out of range.
    pub fn build(self) -> Result<RMConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The best value stalled for `n_stall` consecutive iterations.
    Converged,
    /// `max_iter` iterations were performed.
    MaxIterExceeded,
}

/// Result/report of a random mutations run.
#[derive(Clone)]
pub struct RMReport {
    /// The best solution vector.
    pub x: Array1<f64>,
    /// The objective function value at the best solution.
    pub fun: f64,
    /// Status after every iteration, in order.
    pub steps: Vec<OuterStatus>,
    /// Why the run stopped.
    pub termination: Termination,
    /// Whether the run converged (stall criterion met).
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
    /// Number of iterations performed.
    pub nit: usize,
    /// Number of function evaluations performed.
    pub nfev: usize,
    /// Final population matrix (n_pop x n).
    pub population: Array2<f64>,
    /// Best value of each population member.
    pub population_values: Array1<f64>,
}

impl fmt::Debug for RMReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RMReport")
            .field("x", &format!("len={}", self.x.len()))
            .field("fun", &self.fun)
            .field("termination", &self.termination)
            .field("message", &self.message)
            .field("nit", &self.nit)
            .field("nfev", &self.nfev)
            .field("steps", &format!("len={}", self.steps.len()))
            .field(
                "population",
                &format!("{}x{}", self.population.nrows(), self.population.ncols()),
            )
            .finish()
    }
}

struct SlotOutcome {
    x: Array1<f64>,
    f: f64,
    nfev: usize,
}

/// Mutates, evaluates and selects for one population slot.
///
/// All random draws come from a generator seeded with `seed`, so the outcome
/// does not depend on which thread runs it.
#[allow(clippy::too_many_arguments)]
fn update_slot<O: Objective + ?Sized>(
    objective: &O,
    bounds: &SearchBounds,
    ancestor: Array1<f64>,
    seed: u64,
    params: &MutationParams,
    n_des: usize,
    include_ancestor: bool,
    parallel_descendants: bool,
) -> std::result::Result<SlotOutcome, ObjectiveError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut candidates: Vec<Array1<f64>> = (0..n_des)
        .map(|_| gen_descendant(&ancestor, bounds, params, &mut rng))
        .collect();
    if include_ancestor {
        candidates.push(ancestor);
    }
    let values = evaluate_candidates(&candidates, objective, parallel_descendants)?;
    let nfev = values.len();
    let (best, f) = argmin(&values);
    Ok(SlotOutcome {
        x: candidates.swap_remove(best),
        f,
        nfev,
    })
}

/// Random mutations optimizer.
///
/// Use [`RandomMutations::new`] to create an instance, configure with
/// [`config_mut`](Self::config_mut), then call [`solve`](Self::solve) or
/// [`solve_with_observer`](Self::solve_with_observer).
pub struct RandomMutations<'a, O>
where
    O: Objective + ?Sized,
{
    objective: &'a O,
    bounds: SearchBounds,
    config: RMConfig,
}

impl<'a, O> RandomMutations<'a, O>
where
    O: Objective + ?Sized,
{
    /// Creates a new optimizer for `objective` over `bounds`.
    ///
    /// # Errors
    ///
    /// Returns `RMError::InvalidBounds` if a pair has `lower >= upper` or is
    /// not finite, and `RMError::InvalidConfiguration` if `bounds` is empty.
    pub fn new(objective: &'a O, bounds: &[(f64, f64)]) -> Result<Self> {
        Ok(Self {
            objective,
            bounds: SearchBounds::new(bounds)?,
            config: RMConfig::default(),
        })
    }

    /// Mutable access to configuration
    pub fn config_mut(&mut self) -> &mut RMConfig {
        &mut self.config
    }

    /// The search box.
    pub fn bounds(&self) -> &SearchBounds {
        &self.bounds
    }

    /// Runs the optimization, rendering progress on stderr if `disp` is set.
    pub fn solve(&mut self) -> Result<RMReport> {
        if self.config.disp {
            let mut console = ConsoleObserver::stderr().multiline(self.config.disp_multiline);
            self.solve_with_observer(&mut console)
        } else {
            self.solve_with_observer(&mut NoopObserver)
        }
    }

    /// Runs the optimization, reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Configuration errors are returned before the first evaluation. An
    /// objective failure aborts the run with `RMError::ObjectiveEvaluation`.
    pub fn solve_with_observer<Obs: Observer + ?Sized>(
        &mut self,
        observer: &mut Obs,
    ) -> Result<RMReport> {
        self.config.validate()?;
        self.config.check_step_size(&self.bounds)?;
        let n = self.bounds.dim();
        if let Some(x0) = &self.config.x0
            && x0.len() != n
        {
            return Err(RMError::X0DimensionMismatch {
                expected: n,
                got: x0.len(),
            });
        }

        let start = Instant::now();
        let objective = self.objective;
        let bounds = &self.bounds;
        let params = self.config.mutation_params();
        let npop = self.config.n_pop;
        let n_des = self.config.n_des;
        let n_stall = self.config.n_stall;
        let max_iter = self.config.max_iter;
        let eps = self.config.eps;
        let include_ancestor = self.config.include_ancestor;
        let parallel_slots = self.config.parallel.parallel_slots();
        let parallel_descendants = self.config.parallel.parallel_descendants();

        self.config.parallel.install_thread_pool();

        // RNG
        let mut rng: StdRng = match self.config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => {
                let mut thread_rng = rand::rng();
                StdRng::from_rng(&mut thread_rng)
            }
        };

        let mut pop = match &self.config.x0 {
            Some(x0) => init_around(npop, x0, params.scale, bounds, &mut rng),
            None => init_random(npop, bounds, &mut rng),
        };
        let mut global_fs = vec![f64::INFINITY; npop];
        let mut best_x = pop.row(0).to_owned();
        let mut last_best_f = f64::INFINITY;
        let mut stall = 0usize;
        let mut iteration = 0usize;
        let mut fevals = 0usize;
        let mut steps: Vec<OuterStatus> = Vec::new();

        log::info!(
            "RM init: {} dimensions, population={}, descendants={}, max_iter={}, n_stall={}, parallel={:?}",
            n,
            npop,
            n_des,
            max_iter,
            n_stall,
            self.config.parallel
        );
        observer.on_start(&RunInfo {
            dim: n,
            n_pop: npop,
            n_des,
            max_iter,
            n_stall,
            has_callback: self.config.callback.is_some(),
        });

        while stall < n_stall && iteration < max_iter {
            iteration += 1;
            // one independent stream per slot, drawn in slot order
            let slot_seeds: Vec<u64> = (0..npop).map(|_| rng.random::<u64>()).collect();
            let to_rm_error =
                |source: ObjectiveError| RMError::ObjectiveEvaluation { iteration, source };

            let outcomes: Vec<SlotOutcome> = if parallel_slots {
                let snapshot = &pop;
                (0..npop)
                    .into_par_iter()
                    .map(|i| {
                        update_slot(
                            objective,
                            bounds,
                            snapshot.row(i).to_owned(),
                            slot_seeds[i],
                            &params,
                            n_des,
                            include_ancestor,
                            false,
                        )
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(to_rm_error)?
            } else {
                Vec::new()
            };

            let mut outcomes = outcomes.into_iter();
            for i in 0..npop {
                let outcome = match outcomes.next() {
                    Some(o) => o,
                    None => update_slot(
                        objective,
                        bounds,
                        pop.row(i).to_owned(),
                        slot_seeds[i],
                        &params,
                        n_des,
                        include_ancestor,
                        parallel_descendants,
                    )
                    .map_err(to_rm_error)?,
                };
                pop.row_mut(i).assign(&outcome.x);
                global_fs[i] = outcome.f;
                fevals += outcome.nfev;

                observer.on_inner(&InnerStatus {
                    iteration,
                    elapsed: start.elapsed(),
                    best_value: last_best_f,
                    stall,
                    n_stall,
                    fevals,
                    slot: i,
                    n_slots: npop,
                });
            }

            let (best_idx, new_best_f) = argmin(&global_fs);
            best_x = pop.row(best_idx).to_owned();
            if (last_best_f - new_best_f).abs() < eps {
                stall += 1;
            } else {
                stall = 0;
            }
            last_best_f = new_best_f;

            let mut status = OuterStatus {
                iteration,
                elapsed: start.elapsed(),
                best_value: last_best_f,
                stall,
                n_stall,
                fevals,
                callback_result: None,
            };
            if let Some(cb) = self.config.callback.as_mut() {
                let result = cb(&status);
                status = status.with_callback_result(result);
            }
            log::debug!(
                "RM iter {:4}  best_f={:.6e}  stall={}/{}  fevals={}",
                iteration,
                last_best_f,
                stall,
                n_stall,
                fevals
            );
            observer.on_outer(&status);
            steps.push(status);
        }

        let (termination, message) = if stall >= n_stall {
            (
                Termination::Converged,
                format!(
                    "Converged: best value changed by less than {:.3e} for {} iterations",
                    eps, n_stall
                ),
            )
        } else {
            (
                Termination::MaxIterExceeded,
                format!("Maximum iterations reached: {}", max_iter),
            )
        };

        log::info!(
            "RM finished after {} iterations ({} evaluations): {}",
            iteration,
            fevals,
            message
        );

        let report = RMReport {
            x: best_x,
            fun: last_best_f,
            steps,
            termination,
            success: termination == Termination::Converged,
            message,
            nit: iteration,
            nfev: fevals,
            population: pop,
            population_values: Array1::from(global_fs),
        };
        observer.on_finish(&report);
        Ok(report)
    }
}
