// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TilerunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid zoom specification: {0}")]
    InvalidZoom(String),

    #[error("Input raster does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error(
        "Lock file {} already exists{}; if no run is in progress, delete it and retry",
        path.display(),
        holder.as_deref().map(|h| format!(" (held by {h})")).unwrap_or_default()
    )]
    AlreadyLocked {
        path: PathBuf,
        holder: Option<String>,
    },

    #[error("Tile count estimate unavailable: {0}")]
    EstimationUnavailable(String),

    #[error("Tiling backend failed (exit {code}); see log: {}", log_path.display())]
    BackendFailure { code: i32, log_path: PathBuf },

    #[error("Run interrupted before the backend finished; see log: {}", log_path.display())]
    Interrupted { log_path: PathBuf },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TilerunError>;
