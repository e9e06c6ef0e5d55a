// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod estimate;
pub mod exec;
pub mod fs;
pub mod geo;
pub mod lock;
pub mod logging;
pub mod progress;
pub mod types;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::{default_config_path, load_from_path};
use crate::engine::RunController;
use crate::estimate::RunEstimate;
use crate::exec::BackendCommand;
use crate::fs::RealFileSystem;
use crate::geo::GdalInfoProbe;
use crate::progress::TerminalConsole;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the gdalinfo probe, real filesystem and terminal console
/// - Ctrl-C handling
/// - the run controller
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let probe = Arc::new(GdalInfoProbe::new(
        cfg.estimate.gdalinfo.clone(),
        cfg.estimate.gdalsrsinfo.clone(),
    ));
    let console = Arc::new(TerminalConsole::new());
    let mut controller = RunController::new(cfg, probe, Arc::new(RealFileSystem), console);

    if args.estimate_only {
        controller.validate_input()?;
        match controller.estimate().await {
            Some(est) => print_estimate(&est),
            None => println!("Estimated total tiles: unknown"),
        }
        return Ok(());
    }

    let report = controller.run(shutdown_signal()).await?;
    info!(
        exit_code = report.exit_code,
        done = report.done,
        elapsed = ?report.elapsed,
        "run finished"
    );
    Ok(())
}

/// Load the config file (explicit, default if present, or none) and apply
/// CLI overrides before validating.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let default = default_config_path();
            if default.is_file() {
                debug!(path = %default.display(), "using default config file");
                load_from_path(&default)?
            } else {
                RawConfigFile::default()
            }
        }
    };

    args.apply_overrides(&mut raw);
    Ok(ConfigFile::try_from(raw)?)
}

/// Resolves on Ctrl-C.
///
/// The listener is registered when this is called, not when the future is
/// first polled, so an interrupt that lands while the lock is being taken is
/// held until the controller looks at it. If no listener can be installed the
/// run simply cannot be interrupted this way.
#[cfg(unix)]
fn shutdown_signal() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::interrupt()) {
        Ok(mut sigint) => Box::pin(async move {
            if sigint.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C");
            Box::pin(std::future::pending())
        }
    }
}

#[cfg(not(unix))]
fn shutdown_signal() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl+C"),
        }
    });
    Box::pin(async move {
        if rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    })
}

fn print_estimate(est: &RunEstimate) {
    let b = &est.bbox;
    println!(
        "Bounding box (lon/lat): {:.6}, {:.6} .. {:.6}, {:.6}",
        b.min_lon, b.min_lat, b.max_lon, b.max_lat
    );
    println!("{:>6}  {:>14}", "zoom", "tiles");
    for (z, count) in &est.per_zoom {
        println!("{z:>6}  {count:>14}");
    }
    println!("{:>6}  {:>14}", "total", est.total);
}

/// Dry-run output: resolved settings and the exact backend command line.
fn print_dry_run(cfg: &ConfigFile) {
    println!("tilerun dry-run");
    println!("  input       = {}", cfg.input.display());
    println!("  output_dir  = {}", cfg.output_dir.display());
    if let Some(srs) = &cfg.s_srs {
        println!("  s_srs       = {srs}");
    }
    println!("  zoom        = {}", cfg.tiles.zoom);
    println!("  driver      = {}", cfg.tiles.driver.as_flag());
    println!("  tile size   = {}", cfg.tiles.size);
    println!("  resampling  = {}", cfg.tiles.resampling.as_flag());
    println!("  processes   = {}", cfg.processes());
    println!("  resume      = {}", cfg.backend.resume);
    println!("  log         = {}", cfg.log_path().display());
    println!("  lock        = {}", cfg.lock_path().display());
    println!("  poll        = {:?}", cfg.poll_interval);
    println!();

    let command = BackendCommand::from_config(cfg);
    println!("command:");
    println!("  {}", command.display_line());

    debug!("dry-run complete (no execution)");
}
