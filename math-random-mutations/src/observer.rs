//! Progress observers.
//!
//! The optimizer reports progress through the [`Observer`] trait and never
//! reads anything back, so observers cannot change the result of a run.
//! Any rendering state (last render time, cached values) lives inside the
//! observer instance.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::RMReport;
use crate::status::{InnerStatus, OuterStatus};

/// Static description of a run, given to observers before the first update.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    /// Number of dimensions.
    pub dim: usize,
    /// Population size.
    pub n_pop: usize,
    /// Descendants generated per slot and iteration.
    pub n_des: usize,
    /// Iteration cap.
    pub max_iter: usize,
    /// Stall threshold.
    pub n_stall: usize,
    /// Whether a user callback is configured.
    pub has_callback: bool,
}

/// Receiver of optimizer progress.
pub trait Observer {
    /// Called once before the first iteration.
    fn on_start(&mut self, _info: &RunInfo) {}
    /// Called after each population slot update.
    fn on_inner(&mut self, status: &InnerStatus);
    /// Called once per iteration, after the callback result was attached.
    fn on_outer(&mut self, status: &OuterStatus);
    /// Called once after the last iteration.
    fn on_finish(&mut self, _report: &RMReport) {}
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_start(&mut self, info: &RunInfo) {
        (**self).on_start(info)
    }
    fn on_inner(&mut self, status: &InnerStatus) {
        (**self).on_inner(status)
    }
    fn on_outer(&mut self, status: &OuterStatus) {
        (**self).on_outer(status)
    }
    fn on_finish(&mut self, report: &RMReport) {
        (**self).on_finish(report)
    }
}

impl<O: Observer + ?Sized> Observer for Box<O> {
    fn on_start(&mut self, info: &RunInfo) {
        (**self).on_start(info)
    }
    fn on_inner(&mut self, status: &InnerStatus) {
        (**self).on_inner(status)
    }
    fn on_outer(&mut self, status: &OuterStatus) {
        (**self).on_outer(status)
    }
    fn on_finish(&mut self, report: &RMReport) {
        (**self).on_finish(report)
    }
}

/// Forwards every event to both observers, first `A` then `B`.
impl<A: Observer, B: Observer> Observer for (A, B) {
    fn on_start(&mut self, info: &RunInfo) {
        self.0.on_start(info);
        self.1.on_start(info);
    }
    fn on_inner(&mut self, status: &InnerStatus) {
        self.0.on_inner(status);
        self.1.on_inner(status);
    }
    fn on_outer(&mut self, status: &OuterStatus) {
        self.0.on_outer(status);
        self.1.on_outer(status);
    }
    fn on_finish(&mut self, report: &RMReport) {
        self.0.on_finish(report);
        self.1.on_finish(report);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_inner(&mut self, _status: &InnerStatus) {}
    fn on_outer(&mut self, _status: &OuterStatus) {}
}

/// Observer that forwards per-iteration progress to the `log` facade.
///
/// Outer updates are logged at `info` level, slot updates at `debug` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_inner(&mut self, status: &InnerStatus) {
        log::debug!(
            "RM iter {:4} slot {}/{} fevals={}",
            status.iteration,
            status.slot + 1,
            status.n_slots,
            status.fevals
        );
    }

    fn on_outer(&mut self, status: &OuterStatus) {
        match &status.callback_result {
            Some(cb) => log::info!(
                "RM iter {:4}  best_f={:.6e}  stall={}/{}  fevals={}  callback={}",
                status.iteration,
                status.best_value,
                status.stall,
                status.n_stall,
                status.fevals,
                cb
            ),
            None => log::info!(
                "RM iter {:4}  best_f={:.6e}  stall={}/{}  fevals={}",
                status.iteration,
                status.best_value,
                status.stall,
                status.n_stall,
                status.fevals
            ),
        }
    }
}

/// How the progress column of the console table is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStyle {
    /// `#` for done, `-` for remaining.
    #[default]
    Sharps,
    /// Unicode block characters.
    Bar,
    /// `slot/n_slots` counter.
    Counter,
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Center,
    /// Left aligned after one leading space.
    PaddedLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Iter,
    Time,
    Fevals,
    Result,
    Callback,
    Stall,
    Progress,
}

struct ColumnFormat {
    column: Column,
    header: &'static str,
    header_align: Align,
    align: Align,
    width: usize,
}

const PBAR_WIDTH: usize = 11;

static TABLE: [ColumnFormat; 7] = [
    ColumnFormat {
        column: Column::Iter,
        header: "Iter.",
        header_align: Align::Center,
        align: Align::Center,
        width: 6,
    },
    ColumnFormat {
        column: Column::Time,
        header: "Time",
        header_align: Align::Center,
        align: Align::Center,
        width: 9,
    },
    ColumnFormat {
        column: Column::Fevals,
        header: "F.Evals",
        header_align: Align::Center,
        align: Align::Center,
        width: 15,
    },
    ColumnFormat {
        column: Column::Result,
        header: "Result",
        header_align: Align::Center,
        align: Align::PaddedLeft,
        width: 22,
    },
    ColumnFormat {
        column: Column::Callback,
        header: "Callback Result",
        header_align: Align::Center,
        align: Align::Center,
        width: 22,
    },
    ColumnFormat {
        column: Column::Stall,
        header: "Stall",
        header_align: Align::Center,
        align: Align::Center,
        width: 9,
    },
    ColumnFormat {
        column: Column::Progress,
        header: "Progress",
        header_align: Align::PaddedLeft,
        align: Align::PaddedLeft,
        width: PBAR_WIDTH,
    },
];

fn align(s: &str, width: usize, how: Align) -> String {
    match how {
        Align::Center => format!("{s:^width$}"),
        Align::PaddedLeft => format!("{:<width$}", format!(" {s}")),
    }
}

/// Progress column for slot `slot` out of `n_slots`; `completed` draws a full bar.
fn draw_progress(style: ProgressStyle, slot: usize, n_slots: usize, completed: bool) -> String {
    let size = 2 * (PBAR_WIDTH - 2);
    let progress = if n_slots <= 1 || completed {
        size
    } else {
        (((slot + 1) as f64 / (n_slots - 1) as f64 * size as f64) as usize).min(size)
    };
    match style {
        ProgressStyle::Bar => "█".repeat(progress / 2) + &"▋".repeat(progress % 2),
        ProgressStyle::Counter => {
            if completed {
                format!("{n_slots}/{n_slots}")
            } else {
                format!("{}/{}", slot + 1, n_slots)
            }
        }
        ProgressStyle::Sharps => "#".repeat(progress) + &"-".repeat(size - progress),
    }
}

/// Table renderer writing one row per iteration.
///
/// In multiline mode inner updates redraw the current row (carriage return)
/// and each iteration ends with a newline. In single-line mode every update
/// redraws one permanent line, reusing the evaluation count and callback
/// result of the last finished iteration. Inner redraws closer than
/// `min_interval` to the previous one are skipped.
pub struct ConsoleObserver<W: Write> {
    out: W,
    multiline: bool,
    style: ProgressStyle,
    min_interval: Duration,
    with_callback: bool,
    n_slots: usize,
    last_render: Option<Instant>,
    cached_fevals: Option<usize>,
    cached_callback: Option<String>,
}

impl ConsoleObserver<io::Stderr> {
    /// Console observer on standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ConsoleObserver<W> {
    /// Console observer writing to `out`, multiline, `#` progress bar.
    pub fn new(out: W) -> Self {
        Self {
            out,
            multiline: true,
            style: ProgressStyle::default(),
            min_interval: Duration::from_micros(10),
            with_callback: false,
            n_slots: 0,
            last_render: None,
            cached_fevals: None,
            cached_callback: None,
        }
    }

    /// Selects multiline (default) or single-line rendering.
    pub fn multiline(mut self, v: bool) -> Self {
        self.multiline = v;
        self
    }

    /// Sets the progress column style.
    pub fn style(mut self, v: ProgressStyle) -> Self {
        self.style = v;
        self
    }

    /// Sets the minimum delay between two inner redraws.
    pub fn min_interval(mut self, v: Duration) -> Self {
        self.min_interval = v;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn columns(&self) -> impl Iterator<Item = &'static ColumnFormat> {
        let with_callback = self.with_callback;
        TABLE
            .iter()
            .filter(move |c| with_callback || c.column != Column::Callback)
    }

    fn write_header(&mut self) -> io::Result<()> {
        let line: Vec<String> = self
            .columns()
            .map(|c| align(c.header, c.width, c.header_align))
            .collect();
        writeln!(self.out, "\r{}", line.join("|"))
    }

    fn write_row(&mut self, cells: &[(Column, String)], newline: bool) -> io::Result<()> {
        let line: Vec<String> = self
            .columns()
            .map(|c| {
                let value = cells
                    .iter()
                    .find(|(col, _)| *col == c.column)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("");
                align(value, c.width, c.align)
            })
            .collect();
        if newline {
            writeln!(self.out, "\r{}", line.join("|"))?;
        } else {
            write!(self.out, "\r{}", line.join("|"))?;
        }
        self.out.flush()
    }

    fn render_inner(&mut self, s: &InnerStatus) -> io::Result<()> {
        let progress = draw_progress(self.style, s.slot, s.n_slots, false);
        let time = format!("{:.0}s", s.elapsed.as_secs_f64());
        if self.multiline {
            let cells = [
                (Column::Iter, s.iteration.to_string()),
                (Column::Time, time),
                (Column::Progress, progress),
            ];
            self.write_row(&cells, false)
        } else {
            let cells = [
                (Column::Iter, s.iteration.to_string()),
                (Column::Time, time),
                (Column::Fevals, opt_to_string(self.cached_fevals)),
                (Column::Result, s.best_value.to_string()),
                (Column::Callback, self.cached_callback.clone().unwrap_or_default()),
                (Column::Stall, format!("{}/{}", s.stall, s.n_stall)),
                (Column::Progress, progress),
            ];
            self.write_row(&cells, false)
        }
    }

    fn render_outer(&mut self, s: &OuterStatus) -> io::Result<()> {
        self.cached_fevals = Some(s.fevals);
        self.cached_callback = s.callback_result.clone();
        let cells = [
            (Column::Iter, s.iteration.to_string()),
            (Column::Time, format!("{:.0}s", s.elapsed.as_secs_f64())),
            (Column::Fevals, s.fevals.to_string()),
            (Column::Result, s.best_value.to_string()),
            (Column::Callback, s.callback_result.clone().unwrap_or_default()),
            (Column::Stall, format!("{}/{}", s.stall, s.n_stall)),
            (
                Column::Progress,
                draw_progress(self.style, 0, self.n_slots, true),
            ),
        ];
        self.write_row(&cells, self.multiline)
    }
}

fn opt_to_string(v: Option<usize>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

// Write failures are ignored: a broken terminal must not abort a run.
impl<W: Write> Observer for ConsoleObserver<W> {
    fn on_start(&mut self, info: &RunInfo) {
        self.with_callback = info.has_callback;
        self.n_slots = info.n_pop;
        let _ = writeln!(self.out, "\n\nStarting random mutations...");
        let _ = self.write_header();
    }

    fn on_inner(&mut self, status: &InnerStatus) {
        let now = Instant::now();
        if let Some(last) = self.last_render
            && now.duration_since(last) < self.min_interval
        {
            return;
        }
        self.last_render = Some(now);
        let _ = self.render_inner(status);
    }

    fn on_outer(&mut self, status: &OuterStatus) {
        self.last_render = Some(Instant::now());
        let _ = self.render_outer(status);
    }

    fn on_finish(&mut self, _report: &RMReport) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(has_callback: bool) -> RunInfo {
        RunInfo {
            dim: 2,
            n_pop: 4,
            n_des: 3,
            max_iter: 10,
            n_stall: 5,
            has_callback,
        }
    }

    fn inner(slot: usize) -> InnerStatus {
        InnerStatus {
            iteration: 1,
            elapsed: Duration::from_secs(2),
            best_value: f64::INFINITY,
            stall: 0,
            n_stall: 5,
            fevals: 4 * (slot + 1),
            slot,
            n_slots: 4,
        }
    }

    fn outer() -> OuterStatus {
        OuterStatus {
            iteration: 1,
            elapsed: Duration::from_secs(3),
            best_value: -1.5,
            stall: 0,
            n_stall: 5,
            fevals: 16,
            callback_result: Some("cb-1".to_string()),
        }
    }

    #[test]
    fn test_draw_progress_styles() {
        assert_eq!(draw_progress(ProgressStyle::Sharps, 0, 1, false), "#".repeat(18));
        assert_eq!(
            draw_progress(ProgressStyle::Sharps, 0, 10, false),
            "##".to_string() + &"-".repeat(16)
        );
        assert_eq!(draw_progress(ProgressStyle::Counter, 2, 10, false), "3/10");
        assert_eq!(draw_progress(ProgressStyle::Counter, 0, 10, true), "10/10");
        assert_eq!(draw_progress(ProgressStyle::Bar, 0, 4, true), "█".repeat(9));
    }

    #[test]
    fn test_align() {
        assert_eq!(align("ab", 6, Align::Center), "  ab  ");
        assert_eq!(align("ab", 6, Align::PaddedLeft), " ab   ");
    }

    #[test]
    fn test_header_includes_callback_column_only_with_callback() {
        let mut obs = ConsoleObserver::new(Vec::new());
        obs.on_start(&info(false));
        let text = String::from_utf8(obs.into_inner()).unwrap();
        assert!(text.contains("Starting random mutations..."));
        assert!(text.contains("Iter."));
        assert!(!text.contains("Callback Result"));

        let mut obs = ConsoleObserver::new(Vec::new());
        obs.on_start(&info(true));
        let text = String::from_utf8(obs.into_inner()).unwrap();
        assert!(text.contains("Callback Result"));
    }

    #[test]
    fn test_multiline_outer_row_ends_with_newline() {
        let mut obs = ConsoleObserver::new(Vec::new()).min_interval(Duration::ZERO);
        obs.on_start(&info(true));
        obs.on_inner(&inner(0));
        obs.on_outer(&outer());
        let text = String::from_utf8(obs.into_inner()).unwrap();
        let last_line = text.lines().last().unwrap();
        assert!(text.ends_with('\n'));
        assert!(last_line.contains("-1.5"));
        assert!(last_line.contains("cb-1"));
        assert!(last_line.contains("0/5"));
        assert!(last_line.contains("16"));
    }

    #[test]
    fn test_single_line_reuses_last_outer_values() {
        let mut obs = ConsoleObserver::new(Vec::new())
            .multiline(false)
            .min_interval(Duration::ZERO);
        obs.on_start(&info(true));
        obs.on_outer(&outer());
        let mut next = inner(1);
        next.iteration = 2;
        next.fevals = 999;
        obs.on_inner(&next);
        let text = String::from_utf8(obs.into_inner()).unwrap();
        let last_frame = text.rsplit('\r').next().unwrap();
        assert!(!text.ends_with('\n'));
        assert!(last_frame.contains("cb-1"));
        assert!(last_frame.contains("16"));
        assert!(!last_frame.contains("999"));
    }

    #[test]
    fn test_inner_updates_are_throttled() {
        let mut obs = ConsoleObserver::new(Vec::new()).min_interval(Duration::from_secs(3600));
        obs.on_start(&info(false));
        obs.on_inner(&inner(0));
        obs.on_inner(&inner(1));
        obs.on_inner(&inner(2));
        let text = String::from_utf8(obs.into_inner()).unwrap();
        assert_eq!(text.matches('\r').count(), 2, "header + first inner row only");
    }
}
