#![allow(dead_code)]

use std::path::Path;

use tilerun::config::{ConfigFile, RawConfigFile};
use tilerun::errors::Result;
use tilerun::types::{TileDriver, ZoomRange};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the same defaults a config file with only `[input]` would
/// get, except that estimation is off and polling is fast.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(input: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        let mut config = RawConfigFile::default();
        config.input.raster = Some(input.as_ref().to_path_buf());
        config.input.output_dir = Some(output_dir.as_ref().to_path_buf());
        config.estimate.enabled = false;
        config.run.poll_interval = "50ms".to_string();
        config.run.drain_grace = "500ms".to_string();
        Self { config }
    }

    pub fn zoom(mut self, zoom: &str) -> Self {
        self.config.tiles.zoom = zoom.parse::<ZoomRange>().expect("valid zoom range");
        self
    }

    pub fn driver(mut self, driver: TileDriver) -> Self {
        self.config.tiles.driver = driver;
        self
    }

    pub fn s_srs(mut self, srs: &str) -> Self {
        self.config.input.s_srs = Some(srs.to_string());
        self
    }

    pub fn processes(mut self, n: usize) -> Self {
        self.config.backend.processes = Some(n);
        self
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.config.backend.resume = resume;
        self
    }

    /// Replace the backend with `program args...`.
    pub fn backend(mut self, program: &str, args: &[&str]) -> Self {
        self.config.backend.program = program.to_string();
        self.config.backend.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Backend that runs `script` through `sh -c`.
    ///
    /// The generated tiling flags follow as positional parameters, so the
    /// script sees the output directory as its last argument.
    pub fn shell_backend(self, script: &str) -> Self {
        self.backend("sh", &["-c", script, "tilerun-stub"])
    }

    pub fn echo_patterns(mut self, patterns: &[&str]) -> Self {
        self.config.backend.echo_patterns = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn estimate(mut self, enabled: bool) -> Self {
        self.config.estimate.enabled = enabled;
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.config.run.poll_interval = interval.to_string();
        self
    }

    pub fn break_stale_lock(mut self, value: bool) -> Self {
        self.config.run.break_stale_lock = value;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}
