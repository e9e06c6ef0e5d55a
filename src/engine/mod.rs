// src/engine/mod.rs

//! Run orchestration for tilerun.
//!
//! The [`RunController`] walks one run through its phases:
//!
//! ```text
//! Idle -> Validating -> Estimating -> Locking -> Launching -> Running
//!      -> Draining -> Completed | Failed | Interrupted
//! ```
//!
//! Any phase before `Launching` can fail straight to `Failed` without a
//! backend ever being spawned. The run lock is released on every path out
//! of `Locking` and later.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::estimate::RunEstimate;

pub mod controller;

pub use controller::RunController;

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Validating,
    Estimating,
    Locking,
    Launching,
    Running,
    Draining,
    Completed,
    Failed,
    Interrupted,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Completed | RunPhase::Failed | RunPhase::Interrupted
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub log_path: PathBuf,
    pub exit_code: i32,
    pub estimate: Option<RunEstimate>,
    /// Tiles counted on disk by the final progress tick.
    pub done: u64,
    /// Last rendered progress line.
    pub final_line: String,
    /// A tile path to look at, e.g. `<out>/19/431234/212345.png`.
    pub example_tile: PathBuf,
    pub elapsed: Duration,
}
