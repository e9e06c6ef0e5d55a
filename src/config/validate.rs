// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TilerunError};
use crate::exec::EchoFilter;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TilerunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let input = raw.input.raster.clone().ok_or_else(|| {
            TilerunError::ConfigError(
                "no input raster given (set [input].raster or pass --input)".to_string(),
            )
        })?;
        let output_dir = raw.input.output_dir.clone().ok_or_else(|| {
            TilerunError::ConfigError(
                "no output directory given (set [input].output_dir or pass --output)".to_string(),
            )
        })?;

        validate_tiles(&raw)?;
        validate_backend(&raw)?;
        validate_file_names(&raw)?;

        let poll_interval = positive_duration("[run].poll_interval", &raw.run.poll_interval)?;
        let drain_grace = duration("[run].drain_grace", &raw.run.drain_grace)?;

        let echo_filter = EchoFilter::new(&raw.backend.echo_patterns).map_err(|e| {
            TilerunError::ConfigError(format!("invalid [backend].echo_patterns entry: {e}"))
        })?;

        let s_srs = raw
            .input
            .s_srs
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(ConfigFile {
            input,
            output_dir,
            s_srs,
            tiles: raw.tiles,
            backend: raw.backend,
            estimate: raw.estimate,
            poll_interval,
            drain_grace,
            log_file: raw.run.log_file,
            lock_file: raw.run.lock_file,
            break_stale_lock: raw.run.break_stale_lock,
            echo_filter,
        })
    }
}

fn validate_tiles(cfg: &RawConfigFile) -> Result<()> {
    if cfg.tiles.size == 0 || !cfg.tiles.size.is_power_of_two() {
        return Err(TilerunError::ConfigError(format!(
            "[tiles].size must be a positive power of two (got {})",
            cfg.tiles.size
        )));
    }

    let viewer = cfg.tiles.webviewer.as_str();
    if !matches!(viewer, "none" | "all" | "google" | "openlayers" | "leaflet" | "mapml") {
        return Err(TilerunError::ConfigError(format!(
            "[tiles].webviewer '{viewer}' is not one of none, all, google, openlayers, leaflet, mapml"
        )));
    }

    Ok(())
}

fn validate_backend(cfg: &RawConfigFile) -> Result<()> {
    if cfg.backend.program.trim().is_empty() {
        return Err(TilerunError::ConfigError(
            "[backend].program must not be empty".to_string(),
        ));
    }

    if cfg.backend.processes == Some(0) {
        return Err(TilerunError::ConfigError(
            "[backend].processes must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_file_names(cfg: &RawConfigFile) -> Result<()> {
    for (key, name) in [
        ("[run].log_file", &cfg.run.log_file),
        ("[run].lock_file", &cfg.run.lock_file),
    ] {
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(TilerunError::ConfigError(format!(
                "{key} must be a plain file name inside the output directory (got '{name}')"
            )));
        }
    }

    if cfg.run.log_file == cfg.run.lock_file {
        return Err(TilerunError::ConfigError(
            "[run].log_file and [run].lock_file must differ".to_string(),
        ));
    }

    Ok(())
}

fn duration(key: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value).map_err(|e| TilerunError::ConfigError(format!("{key}: {e}")))
}

fn positive_duration(key: &str, value: &str) -> Result<std::time::Duration> {
    let d = duration(key, value)?;
    if d.is_zero() {
        return Err(TilerunError::ConfigError(format!("{key} must be greater than zero")));
    }
    Ok(d)
}
