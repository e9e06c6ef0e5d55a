// src/exec/mod.rs

//! Backend process supervision.
//!
//! - [`command`] builds the backend command line from configuration.
//! - [`process`] spawns the backend and merges its output streams.
//! - [`log`] appends every output line to the run log.
//! - [`filter`] decides which lines are echoed to the console.
//! - [`supervisor`] ties log and console together per output line.

pub mod command;
pub mod filter;
pub mod log;
pub mod process;
pub mod supervisor;

pub use command::{BackendCommand, resolve_program};
pub use filter::EchoFilter;
pub use log::RunLog;
pub use process::BackendProcess;
pub use supervisor::Supervisor;
