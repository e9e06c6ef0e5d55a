// src/progress/poller.rs

//! Timer-driven progress polling on its own Tokio task.
//!
//! The poller owns the [`RunState`] while the backend runs. Directory walks
//! go to the blocking pool so a slow filesystem never holds up output
//! draining. Stopping the poller performs one last tick and hands the state
//! back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::console::ProgressSink;
use super::monitor::{ProgressMonitor, RunState};

/// Final state and last rendered line of a stopped poller.
#[derive(Debug, Clone)]
pub struct FinalProgress {
    pub state: RunState,
    pub line: String,
}

pub struct PollerHandle {
    stop: oneshot::Sender<()>,
    join: JoinHandle<FinalProgress>,
}

impl PollerHandle {
    /// Stop polling, run the final tick, and return the final progress.
    pub async fn finish(self) -> Result<FinalProgress> {
        // The task may already be gone if it panicked; `join` reports that.
        let _ = self.stop.send(());
        self.join.await.context("progress poller task failed")
    }
}

pub fn spawn_poller(
    monitor: Arc<ProgressMonitor>,
    mut state: RunState,
    interval: Duration,
    sink: Arc<dyn ProgressSink>,
) -> PollerHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    let line = poll_once(&monitor, &mut state).await;
                    sink.update(&line);
                }
            }
        }

        let line = poll_once(&monitor, &mut state).await;
        sink.update(&line);
        debug!(done = state.done, "progress poller stopped");

        FinalProgress { state, line }
    });

    PollerHandle {
        stop: stop_tx,
        join,
    }
}

async fn poll_once(monitor: &Arc<ProgressMonitor>, state: &mut RunState) -> String {
    let counter = Arc::clone(monitor);
    let done = match tokio::task::spawn_blocking(move || counter.count()).await {
        Ok(done) => done,
        Err(e) => {
            warn!(error = %e, "tile count failed; keeping previous count");
            state.done
        }
    };
    monitor.record(state, done, Instant::now())
}
