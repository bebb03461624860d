//! Error types for linewise.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::driver::OutputBlocks;
use crate::transport::ExitStatus;

/// Main error type for linewise operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Child process transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Expectation matching errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Variant and session configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Output blocks collected before the failure, if the error carries them.
    pub fn outputs(&self) -> Option<&OutputBlocks> {
        match self {
            Error::Session(SessionError::Close { outputs, .. })
            | Error::Session(SessionError::Exit { outputs, .. }) => Some(outputs),
            _ => None,
        }
    }

    /// Partially accumulated transcript of the block that was in flight.
    pub fn partial_transcript(&self) -> Option<&str> {
        match self {
            Error::Session(SessionError::Timeout { partial, .. })
            | Error::Session(SessionError::UnexpectedEof { partial, .. }) => Some(partial),
            _ => None,
        }
    }
}

/// Transport layer errors (spawning and talking to the child process).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to open the PTY or spawn the command in it
    #[error("Failed to spawn '{command}': {message}")]
    SpawnFailed { command: String, message: String },

    /// Command string could not be split into arguments
    #[error("Invalid command line: '{command}'")]
    InvalidCommand { command: String },

    /// Child did not exit within the close timeout
    #[error("Process {pid:?} did not exit within {timeout:?}")]
    CloseTimeout { pid: Option<u32>, timeout: Duration },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt matching over the output stream).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No search term appeared within the timeout
    #[error("Prompt not found within {0:?}")]
    PatternTimeout(Duration),

    /// Output stream ended before a search term appeared
    #[error("Output stream closed")]
    Closed,
}

/// Session errors, carrying enough context to diagnose without re-running.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The child could not be spawned or exited before its first prompt
    #[error("Session failed to start '{command}': {message}")]
    Start { command: String, message: String },

    /// No prompt was observed within the timeout
    #[error("Timed out after {timeout:?} waiting for a prompt{}", block_suffix(.block))]
    Timeout {
        block: Option<String>,
        partial: String,
        timeout: Duration,
    },

    /// The child closed its output while a block was being processed
    #[error("Process exited while processing block '{block}'")]
    UnexpectedEof { block: String, partial: String },

    /// The child did not terminate cleanly
    #[error("Process {pid:?} may not have closed")]
    Close {
        pid: Option<u32>,
        outputs: OutputBlocks,
    },

    /// The child terminated with a non-zero status
    #[error("Process exited with {status}")]
    Exit {
        status: ExitStatus,
        outputs: OutputBlocks,
    },

    /// An operation was attempted in the wrong lifecycle state
    #[error("Invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },
}

fn block_suffix(block: &Option<String>) -> String {
    match block {
        Some(key) => format!(" in block '{key}'"),
        None => " at startup".to_string(),
    }
}

/// Variant and session configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Variable dumping was requested but the variant has no template
    #[error("Variant '{variant}' has no dump command template")]
    MissingDumpTemplate { variant: String },

    /// No variant registered under this name or alias
    #[error("Unknown variant: '{name}'")]
    UnknownVariant { name: String },

    /// Variant already registered
    #[error("Variant '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Invalid trim prompt pattern
    #[error("Invalid trim pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Variant definition could not be parsed
    #[error("Failed to parse variant definition: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias using linewise's Error.
pub type Result<T> = std::result::Result<T, Error>;
