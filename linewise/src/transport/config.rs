//! Child process spawn configuration.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{Result, TransportError};

/// How to launch the interpreter process.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Full invocation, split shell-style (e.g. `"R --quiet --vanilla"`).
    pub command: String,

    /// Working directory for the child. Inherits ours when unset.
    pub cwd: Option<PathBuf>,

    /// Environment overrides applied on top of the inherited environment.
    pub env: IndexMap<String, String>,

    /// Terminal width for the PTY.
    pub terminal_width: u16,

    /// Terminal height for the PTY.
    pub terminal_height: u16,
}

impl SpawnConfig {
    /// Create a spawn configuration for `command` with default terminal size.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            env: IndexMap::new(),
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Split the command into program and arguments.
    pub fn argv(&self) -> Result<Vec<String>> {
        match shlex::split(&self.command) {
            Some(argv) if !argv.is_empty() => Ok(argv),
            _ => Err(TransportError::InvalidCommand {
                command: self.command.clone(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_splits_shell_style() {
        let config = SpawnConfig::new("R --quiet --vanilla");
        assert_eq!(config.argv().unwrap(), vec!["R", "--quiet", "--vanilla"]);

        let config = SpawnConfig::new(r#"/bin/sh -c 'printf "> "'"#);
        assert_eq!(
            config.argv().unwrap(),
            vec!["/bin/sh", "-c", r#"printf "> ""#]
        );
    }

    #[test]
    fn test_argv_rejects_empty_and_unbalanced() {
        assert!(SpawnConfig::new("").argv().is_err());
        assert!(SpawnConfig::new("python 'oops").argv().is_err());
    }
}
