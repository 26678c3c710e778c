//! Recording wrapper for random mutations for testing purposes

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::objective::Objective;
use crate::recorder::TraceRecorder;
use crate::{RMConfig, RMError, RMReport, RandomMutations, Result};

/// Get the records directory using the directories crate
pub fn records_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("org", "spinorama", "math-audio").ok_or_else(|| {
        RMError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "failed to determine project directories",
        ))
    })?;
    Ok(proj_dirs.cache_dir().join("records"))
}

/// Run random mutations and write the iteration trace to CSV
///
/// The trace lands in `<cache>/records/<function_name>_trace.csv`. Returns
/// the report together with the CSV path.
pub fn run_recorded_random_mutations<O>(
    function_name: &str,
    objective: &O,
    bounds: &[(f64, f64)],
    config: RMConfig,
) -> Result<(RMReport, PathBuf)>
where
    O: Objective + ?Sized,
{
    let recorder = TraceRecorder::with_output_dir(function_name, records_dir()?);
    run_with_recorder(recorder, objective, bounds, config)
}

pub(crate) fn run_with_recorder<O>(
    mut recorder: TraceRecorder,
    objective: &O,
    bounds: &[(f64, f64)],
    config: RMConfig,
) -> Result<(RMReport, PathBuf)>
where
    O: Objective + ?Sized,
{
    let mut rm = RandomMutations::new(objective, bounds)?;
    *rm.config_mut() = config;
    let report = rm.solve_with_observer(&mut recorder)?;
    let csv_path = recorder.finalize()?;
    log::info!("RM trace for {} iterations saved to {}", report.nit, csv_path.display());
    Ok((report, csv_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RMConfigBuilder;
    use crate::recorder::read_best_values;
    use ndarray::Array1;

    #[test]
    fn test_run_recorded_basic() {
        let quadratic = |x: &Array1<f64>| -> f64 { x.iter().map(|&xi| xi * xi).sum() };
        let bounds = vec![(-5.0, 5.0), (-5.0, 5.0)];
        let config = RMConfigBuilder::new()
            .seed(42)
            .max_iter(30)
            .n_pop(10)
            .build()
            .unwrap();

        let dir = std::env::temp_dir().join(format!("rm_recorded_{}", std::process::id()));
        let recorder = TraceRecorder::with_output_dir("test_quadratic", &dir);
        let (report, csv_path) = run_with_recorder(recorder, &quadratic, &bounds, config).unwrap();

        let values = read_best_values(&csv_path).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(values.len(), report.nit);
        assert_eq!(values.last().copied(), Some(report.fun));
    }
}
