// src/exec/supervisor.rs

//! Per-line handling of backend output while a run is in progress.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::errors::Result;
use crate::progress::ProgressSink;

use super::filter::EchoFilter;
use super::log::RunLog;
use super::process::BackendProcess;

/// How supervision of the backend ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisedExit {
    /// The backend exited on its own with this code.
    Exited(i32),
    /// The shutdown signal fired first; the backend was killed.
    Interrupted,
}

/// Routes every backend line into the run log and echoes selected ones.
pub struct Supervisor {
    log: RunLog,
    filter: EchoFilter,
    sink: Arc<dyn ProgressSink>,
    lines_seen: u64,
}

impl Supervisor {
    pub fn new(log: RunLog, filter: EchoFilter, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            log,
            filter,
            sink,
            lines_seen: 0,
        }
    }

    pub fn log_mut(&mut self) -> &mut RunLog {
        &mut self.log
    }

    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    pub fn handle_line(&mut self, line: &str) {
        self.lines_seen += 1;
        self.log.write_line(line);
        if self.filter.matches(line) {
            self.sink.echo(line);
        } else {
            trace!(line, "backend output");
        }
    }

    /// Drain output until the backend exits or `shutdown` resolves.
    ///
    /// On shutdown the backend is killed before returning.
    pub async fn supervise<F>(
        &mut self,
        process: &mut BackendProcess,
        shutdown: F,
    ) -> Result<SupervisedExit>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let BackendProcess { child, lines } = process;
        let mut stream_open = true;

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("shutdown requested; killing backend");
                    child.kill().await;
                    return Ok(SupervisedExit::Interrupted);
                }

                line = lines.recv(), if stream_open => match line {
                    Some(line) => self.handle_line(&line),
                    None => {
                        debug!("backend output closed before exit");
                        stream_open = false;
                    }
                },

                code = child.wait() => {
                    return Ok(SupervisedExit::Exited(code?));
                }
            }
        }
    }

    /// Read output still buffered after exit, for at most `grace`.
    ///
    /// Returns the number of lines drained.
    pub async fn drain(&mut self, process: &mut BackendProcess, grace: Duration) -> u64 {
        let before = self.lines_seen;
        let drained = tokio::time::timeout(grace, async {
            while let Some(line) = process.lines.recv().await {
                self.handle_line(&line);
            }
        })
        .await;

        if drained.is_err() {
            debug!(?grace, "stopped draining backend output after grace period");
        }
        self.lines_seen - before
    }

    /// Flush the log and hand it back.
    pub fn into_log(mut self) -> RunLog {
        self.log.flush();
        self.log
    }
}
