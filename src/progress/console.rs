// src/progress/console.rs

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Where progress lines and echoed backend output go.
///
/// Production uses [`TerminalConsole`]; tests can record calls instead.
pub trait ProgressSink: Send + Sync {
    /// Print a full backend line above the progress line.
    fn echo(&self, line: &str);

    /// Replace the in-place progress line.
    fn update(&self, rendered: &str);

    /// Leave the last progress line in place and print a closing summary.
    fn finish(&self, summary: &str);
}

/// Single-line progress display on stderr, backend echoes on stdout.
#[derive(Debug, Clone)]
pub struct TerminalConsole {
    bar: ProgressBar,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Console that draws nothing, for non-interactive use.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        let style = ProgressStyle::with_template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        Self { bar }
    }
}

impl ProgressSink for TerminalConsole {
    fn echo(&self, line: &str) {
        // `suspend` clears the bar, prints, and redraws it below the line.
        self.bar.suspend(|| println!("{line}"));
    }

    fn update(&self, rendered: &str) {
        self.bar.set_message(rendered.to_string());
    }

    fn finish(&self, summary: &str) {
        self.bar.finish();
        println!("{summary}");
    }
}
