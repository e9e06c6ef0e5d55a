// src/config/mod.rs

//! Configuration loading and validation for tilerun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Turn the raw model into a validated `ConfigFile` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    BackendSection, ConfigFile, EstimateSection, InputSection, RawConfigFile, RunSection,
    TilesSection,
};
