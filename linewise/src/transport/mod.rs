//! Child process transport layer.
//!
//! A [`Transport`] owns one interactive child process: it writes input to the
//! child, yields output chunks as they arrive, and tears the process down.
//! [`PtyTransport`] is the real implementation, attaching the child to a
//! pseudo-terminal so it behaves as it would for a human at a console.

pub mod config;
mod pty;
#[cfg(test)]
pub(crate) mod scripted;

pub use config::SpawnConfig;
pub use pty::PtyTransport;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Byte-level connection to an interactive child process.
pub trait Transport: Send {
    /// Process identifier of the child, if known.
    fn pid(&self) -> Option<u32>;

    /// Write raw bytes to the child's input.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next chunk of output.
    ///
    /// Returns `Ok(None)` once the child has closed its side of the stream.
    /// Implementations must be cancel safe: dropping the future before it
    /// completes must not lose output.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Close the child's input and wait up to `timeout` for it to exit.
    fn close(&mut self, timeout: Duration) -> impl Future<Output = Result<ExitStatus>> + Send;

    /// Forcibly terminate the child.
    fn kill(&mut self) -> Result<()>;
}

/// Exit status of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    /// Exit code reported by the process.
    pub code: u32,

    /// Terminating signal name, if the process was killed by a signal.
    pub signal: Option<String>,
}

impl ExitStatus {
    /// Status for a process that exited normally with `code`.
    pub fn with_code(code: u32) -> Self {
        Self { code, signal: None }
    }

    /// Whether the process exited with status zero and no signal.
    pub fn success(&self) -> bool {
        self.code == 0 && self.signal.is_none()
    }
}

impl From<portable_pty::ExitStatus> for ExitStatus {
    fn from(status: portable_pty::ExitStatus) -> Self {
        Self {
            code: status.exit_code(),
            signal: status.signal().map(str::to_string),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.signal {
            Some(signal) => write!(f, "signal {signal}"),
            None => write!(f, "exit status {}", self.code),
        }
    }
}
