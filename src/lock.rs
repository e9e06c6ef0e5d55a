// src/lock.rs

//! Single-run lock for an output directory.
//!
//! The lock is a sentinel file created with `create_new`, so two runs racing
//! for the same directory cannot both succeed. Its content (pid and start
//! time) is diagnostic only; existence alone blocks a new run.
//!
//! A [`RunLock`] removes its sentinel on [`RunLock::release`] or, failing
//! that, on drop, which covers early returns, errors and unwinding.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, TilerunError};

/// Parsed content of a lock sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    pub pid: u32,
    pub timestamp: String,
    pub path: PathBuf,
}

impl LockRecord {
    pub fn current(path: &Path) -> Self {
        Self {
            pid: std::process::id(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn to_file_contents(&self) -> String {
        format!("PID={}\nTIME={}\n", self.pid, self.timestamp)
    }

    pub fn parse(path: &Path, contents: &str) -> Option<Self> {
        let mut pid = None;
        let mut timestamp = None;
        for line in contents.lines() {
            match line.split_once('=') {
                Some(("PID", v)) => pid = v.trim().parse().ok(),
                Some(("TIME", v)) => timestamp = Some(v.trim().to_string()),
                _ => {}
            }
        }
        Some(Self {
            pid: pid?,
            timestamp: timestamp.unwrap_or_default(),
            path: path.to_path_buf(),
        })
    }

    pub fn read(path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        Self::parse(path, &contents)
    }
}

/// Whether a process is running, if that can be determined at all.
fn process_alive(pid: u32) -> Option<bool> {
    if cfg!(target_os = "linux") {
        Some(Path::new("/proc").join(pid.to_string()).exists())
    } else {
        None
    }
}

/// Held run lock; the sentinel file exists for as long as this value does.
#[derive(Debug)]
pub struct RunLock {
    record: LockRecord,
    released: bool,
}

impl RunLock {
    /// Create the sentinel at `path`.
    ///
    /// Fails with [`TilerunError::AlreadyLocked`] if it already exists; the
    /// existing file is not modified.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let record = LockRecord::current(path);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = LockRecord::read(path)
                    .map(|r| format!("pid {} since {}", r.pid, r.timestamp));
                return Err(TilerunError::AlreadyLocked {
                    path: path.to_path_buf(),
                    holder,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let lock = Self {
            record,
            released: false,
        };
        // From here on `lock` owns the file and removes it if the write fails.
        file.write_all(lock.record.to_file_contents().as_bytes())?;
        file.sync_all()?;

        info!(path = %path.display(), pid = lock.record.pid, "acquired run lock");
        Ok(lock)
    }

    /// Like [`RunLock::acquire`], but first removes a lock whose recorded
    /// process is known to have exited.
    ///
    /// If the holder's liveness cannot be established the lock is left alone
    /// and `AlreadyLocked` is returned.
    pub fn acquire_breaking_stale(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Self::acquire(path) {
            Err(TilerunError::AlreadyLocked { .. }) => {
                let stale = LockRecord::read(path)
                    .filter(|r| r.pid != std::process::id())
                    .is_some_and(|r| process_alive(r.pid) == Some(false));

                if stale {
                    warn!(path = %path.display(), "removing stale run lock left by an exited process");
                    remove_if_present(path)?;
                }
                Self::acquire(path)
            }
            other => other,
        }
    }

    pub fn record(&self) -> &LockRecord {
        &self.record
    }

    pub fn path(&self) -> &Path {
        &self.record.path
    }

    /// Remove the sentinel. A missing file is not an error.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_if_present(&self.record.path)?;
        info!(path = %self.record.path.display(), "released run lock");
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match remove_if_present(&self.record.path) {
            Ok(()) => debug!(path = %self.record.path.display(), "run lock removed on drop"),
            Err(e) => warn!(
                path = %self.record.path.display(),
                error = %e,
                "failed to remove run lock"
            ),
        }
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
