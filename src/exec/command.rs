// src/exec/command.rs

//! Backend command line construction.
//!
//! Each configuration option maps to exactly one backend flag. The flag
//! names follow `gdal2tiles`.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::config::ConfigFile;

/// Fully built backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    /// Program as configured.
    pub program: String,
    /// Program resolved against `PATH`, or the configured value if not found.
    pub resolved_program: PathBuf,
    pub args: Vec<OsString>,
}

impl BackendCommand {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut args: Vec<OsString> = cfg.backend.args.iter().map(OsString::from).collect();

        let mut flag = |name: &str, value: Option<String>| {
            args.push(name.into());
            if let Some(v) = value {
                args.push(v.into());
            }
        };

        flag("-z", Some(cfg.tiles.zoom.to_string()));
        flag("--xyz", None);
        flag("--tiledriver", Some(cfg.tiles.driver.as_flag().to_string()));
        flag("--processes", Some(cfg.processes().to_string()));
        flag("--resampling", Some(cfg.tiles.resampling.as_flag().to_string()));
        flag("--tilesize", Some(cfg.tiles.size.to_string()));
        flag("--webviewer", Some(cfg.tiles.webviewer.clone()));
        if cfg.backend.resume {
            flag("--resume", None);
        }
        if let Some(srs) = &cfg.s_srs {
            flag("--s_srs", Some(srs.clone()));
        }

        args.extend(cfg.backend.extra_args.iter().map(OsString::from));
        args.push(cfg.input.clone().into_os_string());
        args.push(cfg.output_dir.clone().into_os_string());

        Self {
            program: cfg.backend.program.clone(),
            resolved_program: resolve_program(&cfg.backend.program),
            args,
        }
    }

    /// Human-readable command line for logs; arguments with spaces are quoted.
    pub fn display_line(&self) -> String {
        std::iter::once(self.resolved_program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|a| {
                let a = a.to_string_lossy();
                if a.is_empty() || a.contains(char::is_whitespace) {
                    format!("\"{a}\"")
                } else {
                    a.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Tokio command with both output streams piped and no stdin.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.resolved_program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Look `program` up on `PATH` the way a shell would.
///
/// Anything containing a path separator is taken as-is.
pub fn resolve_program(program: &str) -> PathBuf {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.to_path_buf();
    }

    let Some(paths) = env::var_os("PATH") else {
        return candidate.to_path_buf();
    };

    let exts: Vec<String> = if cfg!(windows) {
        env::var("PATHEXT")
            .unwrap_or_else(|_| ".EXE;.BAT;.CMD".to_string())
            .split(';')
            .map(|s| s.to_string())
            .chain(std::iter::once(String::new()))
            .collect()
    } else {
        vec![String::new()]
    };

    env::split_paths(&paths)
        .flat_map(|dir| exts.iter().map(move |ext| dir.join(format!("{program}{ext}"))))
        .find(|p| p.is_file())
        .unwrap_or_else(|| candidate.to_path_buf())
}
