//! PTY transport using portable-pty.
//!
//! The master side of the PTY is read on a dedicated OS thread (the reader is
//! blocking) and chunks are forwarded to the async side over an unbounded
//! channel, so a pending read can be abandoned by a timeout without losing
//! output.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;

use super::config::SpawnConfig;
use super::{ExitStatus, Transport};
use crate::error::{Result, TransportError};

/// How often `close` polls the child for its exit status.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Transport for a child process attached to a pseudo-terminal.
pub struct PtyTransport {
    /// Master side of the PTY. Held so the terminal stays open.
    _master: Box<dyn MasterPty + Send>,

    /// Writer to the child's input. Dropped on close, which sends EOF.
    writer: Option<Box<dyn Write + Send>>,

    /// The spawned child process.
    child: Box<dyn Child + Send + Sync>,

    /// Output chunks forwarded by the reader thread.
    output: mpsc::UnboundedReceiver<Vec<u8>>,

    /// Process id, captured at spawn time.
    pid: Option<u32>,
}

impl PtyTransport {
    /// Spawn the configured command attached to a fresh PTY.
    pub fn spawn(config: &SpawnConfig) -> Result<Self> {
        let argv = config.argv()?;
        let spawn_failed = |message: String| TransportError::SpawnFailed {
            command: config.command.clone(),
            message,
        };

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: config.terminal_height,
                cols: config.terminal_width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| spawn_failed(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(&argv[0]);
        cmd.args(&argv[1..]);
        if let Some(ref cwd) = config.cwd {
            cmd.cwd(cwd);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| spawn_failed(format!("failed to spawn command: {e}")))?;

        // The child holds its own handle to the slave; ours must go so the
        // master sees EOF once the child exits.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_failed(format!("failed to clone reader: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_failed(format!("failed to take writer: {e}")))?;

        let pid = child.process_id();
        let (tx, rx) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name(format!("linewise-pty-{}", pid.unwrap_or_default()))
            .spawn(move || pump_output(reader, tx))
            .map_err(|e| spawn_failed(format!("failed to start reader thread: {e}")))?;

        debug!("spawned {:?} as pid {:?}", config.command, pid);

        Ok(Self {
            _master: pair.master,
            writer: Some(writer),
            child,
            output: rx,
            pid,
        })
    }
}

/// Forward PTY output to the channel until EOF or the receiver goes away.
fn pump_output(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                trace!("pty read {} bytes", n);
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            // Linux reports EIO on the master once the slave side is gone.
            Err(e) => {
                trace!("pty reader stopped: {}", e);
                break;
            }
        }
    }
}

impl Transport for PtyTransport {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.take().ok_or_else(|| {
            TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "input already closed",
            ))
        })?;
        let data = data.to_vec();

        // The PTY writer blocks once the child stops reading. If the caller
        // gives up on this future the writer stays with the blocking task and
        // later writes fail with BrokenPipe.
        let writer = tokio::task::spawn_blocking(move || {
            writer.write_all(&data)?;
            writer.flush()?;
            Ok::<_, std::io::Error>(writer)
        })
        .await
        .map_err(|e| TransportError::Io(std::io::Error::other(e)))?
        .map_err(TransportError::Io)?;

        self.writer = Some(writer);
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.output.recv().await)
    }

    async fn close(&mut self, timeout: Duration) -> Result<ExitStatus> {
        // Dropping the portable-pty writer sends EOF to the child.
        drop(self.writer.take());

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait().map_err(TransportError::Io)? {
                debug!("pid {:?} exited with {:?}", self.pid, status);
                return Ok(status.into());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(TransportError::CloseTimeout {
                    pid: self.pid,
                    timeout,
                }
                .into());
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
    }

    fn kill(&mut self) -> Result<()> {
        drop(self.writer.take());
        if let Err(e) = self.child.kill() {
            // Already gone is fine; anything else is worth surfacing.
            if self.child.try_wait().map_err(TransportError::Io)?.is_none() {
                return Err(TransportError::Io(e).into());
            }
        }
        Ok(())
    }
}

impl Drop for PtyTransport {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!("pid {:?} still running on drop, killing it", self.pid);
            let _ = self.child.kill();
        }
    }
}
