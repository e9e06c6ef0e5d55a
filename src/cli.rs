// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag except `--config`, `--estimate-only`, `--dry-run` and
//! `--log-level` overrides the matching config file value.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawConfigFile;
use crate::types::{Resampling, TileDriver, ZoomRange};

/// Command-line arguments for `tilerun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tilerun",
    version,
    about = "Run gdal2tiles over a raster with locking, logging and live tile progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Tilerun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Source raster.
    #[arg(long, short = 'i', value_name = "RASTER")]
    pub input: Option<PathBuf>,

    /// Output directory for the tile tree.
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Zoom range, e.g. `0-19` or `14`.
    #[arg(long, short = 'z', value_name = "RANGE")]
    pub zoom: Option<ZoomRange>,

    #[arg(long, value_enum)]
    pub driver: Option<TileDriver>,

    #[arg(long, value_enum)]
    pub resampling: Option<Resampling>,

    /// Tile edge in pixels.
    #[arg(long, value_name = "PX")]
    pub tile_size: Option<u32>,

    /// Worker processes for the backend.
    #[arg(long, value_name = "N")]
    pub processes: Option<usize>,

    /// Source SRS override, e.g. `EPSG:4490`.
    #[arg(long, value_name = "SRS")]
    pub s_srs: Option<String>,

    /// Regenerate tiles that already exist.
    #[arg(long)]
    pub no_resume: bool,

    /// Remove a lock left behind by a process that no longer runs.
    #[arg(long)]
    pub break_stale_lock: bool,

    /// Print the per-zoom tile estimate and exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub estimate_only: bool,

    /// Print the resolved config and backend command line, execute nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TILERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Write the flags that were given on top of a loaded config.
    pub fn apply_overrides(&self, raw: &mut RawConfigFile) {
        if let Some(input) = &self.input {
            raw.input.raster = Some(input.clone());
        }
        if let Some(output) = &self.output {
            raw.input.output_dir = Some(output.clone());
        }
        if let Some(srs) = &self.s_srs {
            raw.input.s_srs = Some(srs.clone());
        }
        if let Some(zoom) = self.zoom {
            raw.tiles.zoom = zoom;
        }
        if let Some(driver) = self.driver {
            raw.tiles.driver = driver;
        }
        if let Some(resampling) = self.resampling {
            raw.tiles.resampling = resampling;
        }
        if let Some(size) = self.tile_size {
            raw.tiles.size = size;
        }
        if let Some(n) = self.processes {
            raw.backend.processes = Some(n);
        }
        if self.no_resume {
            raw.backend.resume = false;
        }
        if self.break_stale_lock {
            raw.run.break_stale_lock = true;
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
