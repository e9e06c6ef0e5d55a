// src/progress/monitor.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::fs::{FileSystem, count_files_with_extension};

/// Width of the determinate bar in cells.
pub const BAR_WIDTH: usize = 30;

const SPINNER: [&str; 6] = ["⠋", "⠙", "⠸", "⠴", "⠦", "⠇"];

/// Floor for the time between two polls when computing a rate.
const MIN_RATE_WINDOW: f64 = 1e-6;

/// Mutable progress bookkeeping for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunState {
    pub start: Instant,
    pub last_poll: Instant,
    pub last_count: u64,
    /// Tiles per second over the last poll window.
    pub rate: f64,
    pub done: u64,
}

impl RunState {
    /// State at `start` with `baseline` tiles already on disk (resumed runs).
    pub fn new(start: Instant, baseline: u64) -> Self {
        Self {
            start,
            last_poll: start,
            last_count: baseline,
            rate: 0.0,
            done: baseline,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.last_poll.saturating_duration_since(self.start)
    }
}

/// Counts tiles under the output tree and renders the progress line.
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    fs: Arc<dyn FileSystem>,
    output_dir: PathBuf,
    extension: String,
    total: Option<u64>,
}

impl ProgressMonitor {
    /// `total` of `None` (or zero) selects the spinner display.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        output_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        total: Option<u64>,
    ) -> Self {
        Self {
            fs,
            output_dir: output_dir.into(),
            extension: extension.into(),
            total: total.filter(|&t| t > 0),
        }
    }

    /// Walk the output tree and count tiles. Runs from scratch every call.
    pub fn count(&self) -> u64 {
        count_files_with_extension(self.fs.as_ref(), &self.output_dir, &self.extension)
    }

    /// Count now and fold the result into `state`.
    pub fn tick(&self, state: &mut RunState) -> String {
        let done = self.count();
        self.record(state, done, Instant::now())
    }

    /// Fold an observed count taken at `now` into `state` and render.
    pub fn record(&self, state: &mut RunState, done: u64, now: Instant) -> String {
        let window = now
            .saturating_duration_since(state.last_poll)
            .as_secs_f64()
            .max(MIN_RATE_WINDOW);

        state.rate = (done as f64 - state.last_count as f64) / window;
        state.done = done;
        state.last_count = done;
        state.last_poll = now;

        render(done, self.total, state.elapsed(), state.rate)
    }
}

/// `HH:MM:SS`; hours keep counting past 99.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Percentage of `total` done. Not clamped: the estimate is an upper bound
/// of the envelope, but resumed or foreign files can still push it past 100.
pub fn percent(done: u64, total: u64) -> f64 {
    done as f64 / total as f64 * 100.0
}

/// Render one progress line.
pub fn render(done: u64, total: Option<u64>, elapsed: Duration, rate: f64) -> String {
    let clock = format_elapsed(elapsed);

    match total.filter(|&t| t > 0) {
        Some(total) => {
            let pct = percent(done, total);
            let filled = ((BAR_WIDTH as f64 * pct / 100.0) as usize).min(BAR_WIDTH);
            let bar = format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled));
            format!("[{bar}] {pct:5.1}%  tiles {done}/{total}  {rate:6.1}/s  elapsed {clock}")
        }
        None => {
            let idx = (elapsed.as_secs_f64() * 5.0) as usize % SPINNER.len();
            let glyph = SPINNER[idx];
            format!("{glyph} tiles {done}  {rate:6.1}/s  elapsed {clock}")
        }
    }
}
