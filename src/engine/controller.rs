// src/engine/controller.rs

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{Result, TilerunError};
use crate::estimate::{self, RunEstimate};
use crate::exec::supervisor::SupervisedExit;
use crate::exec::{BackendCommand, BackendProcess, RunLog, Supervisor};
use crate::fs::FileSystem;
use crate::geo::RasterProbe;
use crate::lock::RunLock;
use crate::progress::{ProgressMonitor, ProgressSink, RunState, spawn_poller};

use super::{RunPhase, RunReport};

/// Drives a single tiling run from validation to its terminal phase.
pub struct RunController {
    cfg: ConfigFile,
    probe: Arc<dyn RasterProbe>,
    fs: Arc<dyn FileSystem>,
    sink: Arc<dyn ProgressSink>,
    phase: RunPhase,
}

impl fmt::Debug for RunController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunController")
            .field("input", &self.cfg.input)
            .field("output_dir", &self.cfg.output_dir)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl RunController {
    pub fn new(
        cfg: ConfigFile,
        probe: Arc<dyn RasterProbe>,
        fs: Arc<dyn FileSystem>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            cfg,
            probe,
            fs,
            sink,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, phase: RunPhase) {
        if phase.is_terminal() {
            info!(from = %self.phase, to = %phase, "run reached terminal phase");
        } else {
            debug!(from = %self.phase, to = %phase, "run phase change");
        }
        self.phase = phase;
    }

    fn fail<T>(&mut self, err: TilerunError) -> Result<T> {
        self.enter(RunPhase::Failed);
        Err(err)
    }

    /// Check that the input raster exists.
    pub fn validate_input(&self) -> Result<()> {
        if !self.fs.exists(&self.cfg.input) {
            return Err(TilerunError::MissingInput(self.cfg.input.clone()));
        }
        Ok(())
    }

    /// Tile estimate for the configured raster and zoom range, if obtainable.
    pub async fn estimate(&self) -> Option<RunEstimate> {
        if !self.cfg.estimate.enabled {
            info!("tile estimate disabled by configuration");
            return None;
        }

        let probe = Arc::clone(&self.probe);
        let raster = self.cfg.input.clone();
        let srs = self.cfg.s_srs.clone();
        let zoom = self.cfg.tiles.zoom;

        match tokio::task::spawn_blocking(move || {
            estimate::estimate(probe.as_ref(), &raster, srs.as_deref(), zoom)
        })
        .await
        {
            Ok(est) => est,
            Err(e) => {
                warn!(error = %e, "estimation task failed; continuing without an estimate");
                None
            }
        }
    }

    /// Run the backend to completion.
    ///
    /// `shutdown` is watched from estimation onwards. Resolving before the
    /// backend starts ends the run without spawning it; resolving while the
    /// backend runs kills it. Both end as [`TilerunError::Interrupted`]. The
    /// lock is released on every path that acquired it.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.enter(RunPhase::Validating);
        if let Err(e) = self.validate_input() {
            return self.fail(e);
        }
        if let Err(e) = std::fs::create_dir_all(&self.cfg.output_dir) {
            return self.fail(e.into());
        }

        self.enter(RunPhase::Estimating);
        let estimated = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            est = self.estimate() => Some(est),
        };
        let Some(estimate) = estimated else {
            return self.interrupted_before_launch();
        };
        match &estimate {
            Some(est) => self.sink.echo(&format!("Estimated total tiles: {}", est.total)),
            None => self.sink.echo("Estimated total tiles: unknown"),
        }

        self.enter(RunPhase::Locking);
        let lock_path = self.cfg.lock_path();
        let acquired = if self.cfg.break_stale_lock {
            RunLock::acquire_breaking_stale(&lock_path)
        } else {
            RunLock::acquire(&lock_path)
        };
        let lock = match acquired {
            Ok(lock) => lock,
            Err(e) => return self.fail(e),
        };

        // From here on `lock` is dropped (and the file removed) on any early
        // return; the normal path releases it explicitly at the end.
        let result = self.launch_and_supervise(estimate, shutdown.as_mut()).await;

        if let Err(e) = lock.release() {
            error!(error = %e, "failed to release run lock");
        }

        match &result {
            Ok(_) => self.enter(RunPhase::Completed),
            Err(TilerunError::Interrupted { .. }) => self.enter(RunPhase::Interrupted),
            Err(_) => self.enter(RunPhase::Failed),
        }
        result
    }

    /// Interrupt that arrived before the lock was taken: nothing to undo.
    fn interrupted_before_launch<T>(&mut self) -> Result<T> {
        self.enter(RunPhase::Interrupted);
        self.sink.finish("Interrupted before the backend was started.");
        Err(TilerunError::Interrupted {
            log_path: self.cfg.log_path(),
        })
    }

    async fn launch_and_supervise<F>(
        &mut self,
        estimate: Option<RunEstimate>,
        mut shutdown: F,
    ) -> Result<RunReport>
    where
        F: Future<Output = ()> + Unpin,
    {
        self.enter(RunPhase::Launching);
        let command = BackendCommand::from_config(&self.cfg);
        let log_path = self.cfg.log_path();

        let mut log = RunLog::open(&log_path)?;
        log.write_start(&command);
        self.sink.echo(&format!("Launching: {}", command.display_line()));

        let monitor = Arc::new(ProgressMonitor::new(
            Arc::clone(&self.fs),
            self.cfg.output_dir.clone(),
            self.cfg.tile_extension(),
            estimate.as_ref().map(|e| e.total),
        ));
        // The baseline walk can take minutes on a large resumed pyramid.
        let counting = Arc::clone(&monitor);
        let counted = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            res = tokio::task::spawn_blocking(move || counting.count()) => Some(res),
        };
        let baseline = match counted {
            Some(Ok(n)) => n,
            Some(Err(e)) => {
                warn!(error = %e, "baseline count failed; assuming an empty output tree");
                0
            }
            None => {
                log.write_interrupted();
                log.flush();
                self.sink.finish(&format!(
                    "Interrupted before the backend was started. Log: {}",
                    log_path.display()
                ));
                return Err(TilerunError::Interrupted { log_path });
            }
        };
        if baseline > 0 {
            info!(baseline, "tiles already present in output directory");
        }

        let mut process = match BackendProcess::spawn(&command) {
            Ok(p) => p,
            Err(e) => {
                log.write_line(&format!("failed to start backend: {e:#}"));
                return Err(e.into());
            }
        };

        self.enter(RunPhase::Running);
        let start = Instant::now();
        let poller = spawn_poller(
            Arc::clone(&monitor),
            RunState::new(start, baseline),
            self.cfg.poll_interval,
            Arc::clone(&self.sink),
        );

        let mut supervisor = Supervisor::new(log, self.cfg.echo_filter.clone(), Arc::clone(&self.sink));
        let outcome = supervisor.supervise(&mut process, shutdown).await;

        if let Ok(SupervisedExit::Exited(_)) = outcome {
            self.enter(RunPhase::Draining);
            let drained = supervisor.drain(&mut process, self.cfg.drain_grace).await;
            debug!(drained, "drained remaining backend output");
        }

        // Final tick strictly after the backend is gone.
        let progress = poller.finish().await;

        let mut log = supervisor.into_log();
        match &outcome {
            Ok(SupervisedExit::Exited(code)) => log.write_end(*code),
            Ok(SupervisedExit::Interrupted) => log.write_interrupted(),
            Err(e) => log.write_line(&format!("supervision error: {e}")),
        }
        log.flush();
        drop(log);

        let progress = progress?;
        let elapsed = start.elapsed();

        match outcome? {
            SupervisedExit::Interrupted => {
                self.sink.finish(&format!(
                    "Interrupted after {}; re-run to resume. Log: {}",
                    crate::progress::format_elapsed(elapsed),
                    log_path.display()
                ));
                Err(TilerunError::Interrupted { log_path })
            }
            SupervisedExit::Exited(code) if code != 0 => {
                self.sink.finish(&format!(
                    "Backend failed (exit {code}). See log: {}",
                    log_path.display()
                ));
                Err(TilerunError::BackendFailure { code, log_path })
            }
            SupervisedExit::Exited(code) => {
                let example_tile = self.example_tile(estimate.as_ref());
                self.sink.finish(&format!(
                    "Done. Output: {}\nExample (XYZ): {}",
                    self.cfg.output_dir.display(),
                    example_tile.display()
                ));
                info!(done = progress.state.done, ?elapsed, "tiling completed");

                Ok(RunReport {
                    output_dir: self.cfg.output_dir.clone(),
                    log_path,
                    exit_code: code,
                    estimate,
                    done: progress.state.done,
                    final_line: progress.line,
                    example_tile,
                    elapsed,
                })
            }
        }
    }

    /// Path of a tile at the deepest zoom, under the raster centre if known.
    fn example_tile(&self, estimate: Option<&RunEstimate>) -> PathBuf {
        let z = self.cfg.tiles.zoom.end();
        let ext = self.cfg.tile_extension();
        let base = self.cfg.output_dir.join(z.to_string());

        match estimate {
            Some(est) => {
                let tile = est.sample_tile(z);
                base.join(tile.x.to_string()).join(format!("{}.{ext}", tile.y))
            }
            None => base.join("X").join(format!("Y.{ext}")),
        }
    }
}
