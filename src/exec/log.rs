// src/exec/log.rs

//! Append-only run log.
//!
//! Every backend output line lands here. Opening the log is the last fallible
//! step before launch; after that, write errors are reported once and
//! otherwise ignored so a full disk cannot kill a half-finished run.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::command::BackendCommand;

pub const START_MARKER: &str = "===== Run Start =====";
pub const END_MARKER: &str = "===== Run End";
pub const INTERRUPTED_MARKER: &str = "===== Run Interrupted =====";

#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
    write_failed: bool,
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl RunLog {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            write_failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_start(&mut self, command: &BackendCommand) {
        let text = format!(
            "\n[{}] {START_MARKER}\nPROGRAM: {}\nCMD: {}\n",
            timestamp(),
            command.resolved_program.display(),
            command.display_line()
        );
        self.write_raw(&text);
        self.flush();
    }

    pub fn write_line(&mut self, line: &str) {
        self.write_raw(line);
        self.write_raw("\n");
    }

    pub fn write_end(&mut self, exit_code: i32) {
        let text = format!("[{}] {END_MARKER} (exit {exit_code}) =====\n", timestamp());
        self.write_raw(&text);
    }

    pub fn write_interrupted(&mut self) {
        let text = format!("[{}] {INTERRUPTED_MARKER}\n", timestamp());
        self.write_raw(&text);
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            self.report(e);
        }
    }

    fn write_raw(&mut self, text: &str) {
        if let Err(e) = self.writer.write_all(text.as_bytes()) {
            self.report(e);
        }
    }

    fn report(&mut self, err: std::io::Error) {
        if !self.write_failed {
            self.write_failed = true;
            warn!(path = %self.path.display(), error = %err, "failed to write run log; continuing");
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
