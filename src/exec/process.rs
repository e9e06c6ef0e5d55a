// src/exec/process.rs

//! Backend process handle with a merged output stream.
//!
//! stdout and stderr are each drained by their own Tokio task; both feed a
//! single channel, so the receiver sees one interleaved stream of lines.
//! The channel closes once both pipes reach EOF.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::command::BackendCommand;

const LINE_CHANNEL_CAPACITY: usize = 256;

/// Running backend: the child handle and its merged output lines.
///
/// The two halves are separate fields so a caller can wait on the child and
/// read lines in the same `select!`.
#[derive(Debug)]
pub struct BackendProcess {
    pub child: BackendChild,
    pub lines: mpsc::Receiver<String>,
}

#[derive(Debug)]
pub struct BackendChild(Child);

impl BackendProcess {
    pub fn spawn(command: &BackendCommand) -> Result<Self> {
        info!(cmd = %command.display_line(), "starting backend process");

        let mut child = command
            .to_command()
            .spawn()
            .with_context(|| format!("spawning backend '{}'", command.resolved_program.display()))?;

        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

        if let Some(stdout) = child.stdout.take() {
            spawn_line_pump(stdout, "stdout", tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_pump(stderr, "stderr", tx);
        }

        Ok(Self {
            child: BackendChild(child),
            lines: rx,
        })
    }
}

impl BackendChild {
    /// Wait for exit and return the exit code (`-1` when killed by a signal).
    pub async fn wait(&mut self) -> Result<i32> {
        let status = self.0.wait().await.context("waiting for backend process")?;
        let code = status.code().unwrap_or(-1);
        info!(exit_code = code, success = status.success(), "backend process exited");
        Ok(code)
    }

    pub async fn kill(&mut self) {
        if let Err(e) = self.0.kill().await {
            warn!(error = %e, "failed to kill backend process");
        }
    }
}

fn spawn_line_pump<R>(stream: R, name: &'static str, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    // Invalid UTF-8 is replaced rather than ending the stream.
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(stream = name, error = %e, "error reading backend output");
                    break;
                }
            }
        }

        debug!(stream = name, "backend output stream closed");
    });
}
