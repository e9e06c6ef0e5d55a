// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::EchoFilter;
use crate::types::{Resampling, TileDriver, ZoomRange};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [input]
/// raster = "ortho/site.tif"
/// output_dir = "tiles/site"
/// s_srs = "EPSG:4490"
///
/// [tiles]
/// zoom = "0-19"
/// driver = "png"
///
/// [backend]
/// program = "python3"
/// args = ["-m", "osgeo_utils.gdal2tiles"]
/// resume = true
///
/// [run]
/// poll_interval = "1s"
/// ```
///
/// Every section is optional. `input.raster` and `input.output_dir` must be
/// present after CLI overrides are applied, which validation checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub input: InputSection,

    #[serde(default)]
    pub tiles: TilesSection,

    #[serde(default)]
    pub backend: BackendSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub estimate: EstimateSection,
}

/// `[input]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputSection {
    /// Source raster handed to the backend.
    #[serde(default)]
    pub raster: Option<PathBuf>,

    /// Root of the tile tree; also holds the run log and lock file.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Source SRS override (`--s_srs`), e.g. `"EPSG:4490"`.
    #[serde(default)]
    pub s_srs: Option<String>,
}

/// `[tiles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TilesSection {
    #[serde(default = "default_zoom")]
    pub zoom: ZoomRange,

    #[serde(default)]
    pub driver: TileDriver,

    /// Tile edge in pixels.
    #[serde(default = "default_tile_size")]
    pub size: u32,

    #[serde(default)]
    pub resampling: Resampling,

    /// Viewer HTML the backend should emit (`none`, `leaflet`, `openlayers`, `all`).
    #[serde(default = "default_webviewer")]
    pub webviewer: String,
}

fn default_zoom() -> ZoomRange {
    ZoomRange::new(0, 19)
}

fn default_tile_size() -> u32 {
    256
}

fn default_webviewer() -> String {
    "none".to_string()
}

impl Default for TilesSection {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            driver: TileDriver::default(),
            size: default_tile_size(),
            resampling: Resampling::default(),
            webviewer: default_webviewer(),
        }
    }
}

/// `[backend]` section: how to launch the tiler.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    /// Executable to run. Resolved against `PATH` for the run log.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the generated tiling flags.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Worker processes hint. Defaults to the available parallelism.
    #[serde(default)]
    pub processes: Option<usize>,

    /// Skip tiles that already exist from an earlier run.
    #[serde(default = "default_true")]
    pub resume: bool,

    /// Extra flags appended after the generated ones, before the paths.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Regexes selecting backend output lines echoed to the console.
    /// Every line is written to the run log regardless.
    #[serde(default = "default_echo_patterns")]
    pub echo_patterns: Vec<String>,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-m".to_string(), "osgeo_utils.gdal2tiles".to_string()]
}

fn default_true() -> bool {
    true
}

pub fn default_echo_patterns() -> Vec<String> {
    ["Generating", "Tile", "Overview", "Base", "ERROR", "WARNING"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            processes: None,
            resume: true,
            extra_args: Vec::new(),
            echo_patterns: default_echo_patterns(),
        }
    }
}

/// `[run]` section: supervision settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// How often the output tree is re-counted, e.g. `"1s"`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// How long to keep reading buffered output after the backend exits.
    #[serde(default = "default_drain_grace")]
    pub drain_grace: String,

    /// Run log file name inside the output directory.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Lock sentinel file name inside the output directory.
    #[serde(default = "default_lock_file")]
    pub lock_file: String,

    /// Remove a lock left by a process that is known to have exited.
    #[serde(default)]
    pub break_stale_lock: bool,
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

fn default_drain_grace() -> String {
    "2s".to_string()
}

fn default_log_file() -> String {
    "gdal2tiles_log.txt".to_string()
}

fn default_lock_file() -> String {
    ".tilerun.lock".to_string()
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            drain_grace: default_drain_grace(),
            log_file: default_log_file(),
            lock_file: default_lock_file(),
            break_stale_lock: false,
        }
    }
}

/// `[estimate]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateSection {
    /// Set to false to skip probing and always show the spinner.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_gdalinfo")]
    pub gdalinfo: String,

    #[serde(default = "default_gdalsrsinfo")]
    pub gdalsrsinfo: String,
}

fn default_gdalinfo() -> String {
    "gdalinfo".to_string()
}

fn default_gdalsrsinfo() -> String {
    "gdalsrsinfo".to_string()
}

impl Default for EstimateSection {
    fn default() -> Self {
        Self {
            enabled: true,
            gdalinfo: default_gdalinfo(),
            gdalsrsinfo: default_gdalsrsinfo(),
        }
    }
}

/// Validated run configuration.
///
/// Built from a [`RawConfigFile`] through `TryFrom`, which resolves
/// durations, compiles echo patterns and requires the input/output paths.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub s_srs: Option<String>,
    pub tiles: TilesSection,
    pub backend: BackendSection,
    pub estimate: EstimateSection,
    pub poll_interval: Duration,
    pub drain_grace: Duration,
    pub log_file: String,
    pub lock_file: String,
    pub break_stale_lock: bool,
    pub echo_filter: EchoFilter,
}

impl ConfigFile {
    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.output_dir.join(&self.lock_file)
    }

    pub fn tile_extension(&self) -> &'static str {
        self.tiles.driver.extension()
    }

    /// Worker count handed to the backend.
    pub fn processes(&self) -> usize {
        self.backend.processes.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
