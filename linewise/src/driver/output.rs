//! Session results and exit-status policy.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::OutputBlocks;
use crate::transport::ExitStatus;

/// What to do when the interpreter exits with a non-zero status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Fail with [`SessionError::Exit`](crate::error::SessionError::Exit),
    /// which still carries every collected block.
    #[default]
    Strict,

    /// Log a warning, record it in [`SessionOutput::warnings`] and return
    /// the blocks as usual.
    Lenient,
}

/// Result of a completed session.
///
/// Serializes with blocks in input order, so a caller can store it as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutput {
    /// Trimmed transcript per input block, in input order.
    pub blocks: OutputBlocks,

    /// How the interpreter exited.
    pub exit_status: ExitStatus,

    /// Where the interpreter was told to write its variables, if requested.
    pub vars_artifact: Option<PathBuf>,

    /// Non-fatal problems, such as a non-zero exit under the lenient policy.
    pub warnings: Vec<String>,
}

impl SessionOutput {
    /// Transcript for one block.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.blocks.get(key).map(String::as_str)
    }

    /// Block keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    /// Whether the interpreter exited successfully with nothing to warn about.
    pub fn is_clean(&self) -> bool {
        self.exit_status.success() && self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_output_accessors() {
        let mut blocks = OutputBlocks::new();
        blocks.insert("setup".to_string(), ">>> x = 1".to_string());
        blocks.insert("show".to_string(), ">>> x\r\n1".to_string());

        let output = SessionOutput {
            blocks,
            exit_status: ExitStatus::with_code(0),
            vars_artifact: None,
            warnings: vec![],
        };

        assert_eq!(output.get("show"), Some(">>> x\r\n1"));
        assert_eq!(output.get("missing"), None);
        assert_eq!(output.keys().collect::<Vec<_>>(), vec!["setup", "show"]);
        assert!(output.is_clean());
    }

    #[test]
    fn test_session_output_json_keeps_block_order() {
        let mut blocks = OutputBlocks::new();
        blocks.insert("zeta".to_string(), ">>> 1".to_string());
        blocks.insert("alpha".to_string(), ">>> 2".to_string());
        let output = SessionOutput {
            blocks,
            exit_status: ExitStatus::with_code(1),
            vars_artifact: Some(PathBuf::from("/tmp/doc-vars.json")),
            warnings: vec!["'python' exited with exit status 1".to_string()],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.starts_with(r#"{"blocks":{"zeta":">>> 1","alpha":">>> 2"}"#));

        let parsed: SessionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_exit_policy_serde() {
        assert_eq!(ExitPolicy::default(), ExitPolicy::Strict);
        let policy: ExitPolicy = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(policy, ExitPolicy::Lenient);
    }
}
