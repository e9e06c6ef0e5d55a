// src/progress/mod.rs

//! Progress reporting while the backend runs.
//!
//! - [`monitor`] counts tiles on disk and renders the progress line.
//! - [`poller`] runs the monitor on a fixed interval in its own task.
//! - [`console`] is where rendered lines and echoed output are shown.

pub mod console;
pub mod monitor;
pub mod poller;

pub use console::{ProgressSink, TerminalConsole};
pub use monitor::{ProgressMonitor, RunState, format_elapsed, render};
pub use poller::{FinalProgress, PollerHandle, spawn_poller};
