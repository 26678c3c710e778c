use std::fs::{File, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::observer::{Observer, RunInfo};
use crate::status::{InnerStatus, OuterStatus};

/// Records the per-iteration trace of a run and writes it as CSV.
///
/// Inner updates are ignored; one row is kept per outer iteration.
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    /// Function name (used for the CSV filename)
    function_name: String,
    /// Output directory for CSV files
    output_dir: PathBuf,
    /// Outer snapshots in iteration order
    steps: Vec<OuterStatus>,
    /// Problem dimension, known after `on_start`
    dim: Option<usize>,
}

impl TraceRecorder {
    /// Create a recorder writing `<function_name>_trace.csv` into `output_dir`
    pub fn with_output_dir(function_name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            function_name: function_name.into(),
            output_dir: output_dir.into(),
            steps: Vec::new(),
            dim: None,
        }
    }

    /// Recorded outer snapshots
    pub fn steps(&self) -> &[OuterStatus] {
        &self.steps
    }

    /// Problem dimension of the recorded run
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    /// Path of the CSV file written by [`finalize`](Self::finalize)
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_trace.csv", self.function_name))
    }

    /// Write the trace to `writer` as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut out = BufWriter::new(writer);
        writeln!(
            out,
            "iteration,elapsed_s,fevals,best_value,stall,n_stall,callback_result"
        )?;
        for s in &self.steps {
            writeln!(
                out,
                "{},{:.6},{},{:.16e},{},{},{}",
                s.iteration,
                s.elapsed.as_secs_f64(),
                s.fevals,
                s.best_value,
                s.stall,
                s.n_stall,
                csv_field(s.callback_result.as_deref().unwrap_or(""))
            )?;
        }
        out.flush()
    }

    /// Write the trace to its CSV file, creating the output directory if needed
    pub fn finalize(&self) -> io::Result<PathBuf> {
        create_dir_all(&self.output_dir)?;
        let path = self.csv_path();
        self.write_csv(File::create(&path)?)?;
        Ok(path)
    }

    /// Clear all recorded iterations
    pub fn clear(&mut self) {
        self.steps.clear();
        self.dim = None;
    }
}

/// Keeps a field on one line and quotes it when it holds a separator or quote.
fn csv_field(s: &str) -> String {
    let s = s.replace(['\n', '\r'], " ");
    if s.contains([',', '"']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s
    }
}

impl Observer for TraceRecorder {
    fn on_start(&mut self, info: &RunInfo) {
        self.steps.clear();
        self.dim = Some(info.dim);
    }

    fn on_inner(&mut self, _status: &InnerStatus) {}

    fn on_outer(&mut self, status: &OuterStatus) {
        self.steps.push(status.clone());
    }
}

/// Read the `best_value` column back from a trace file.
pub fn read_best_values<P: AsRef<Path>>(path: P) -> io::Result<Vec<f64>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            line.split(',')
                .nth(3)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("bad trace row: {line}"))
                })
        })
        .collect()
}
