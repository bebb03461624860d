//! Session driver.
//!
//! [`SessionDriver`] takes named input blocks, runs them through one
//! interpreter process and returns a trimmed transcript per block. The
//! state machine doing the work is [`Session`], usable on its own when a
//! caller wants to drive the steps itself.

mod builder;
mod inject;
mod output;
mod session;
mod transcript;

pub use builder::{SessionBuilder, SessionConfig};
pub use inject::{SAVE_VARS_KEY, inject_variable_dump, vars_artifact_name};
pub use output::{ExitPolicy, SessionOutput};
pub use session::{Session, SessionState};
pub use transcript::{BlockTranscript, Carry, TranscriptTrimmer};

use std::borrow::Cow;

use indexmap::IndexMap;
use log::{debug, info};

use crate::error::Result;
use crate::transport::Transport;

/// Named input blocks, in document order.
pub type InputBlocks = IndexMap<String, String>;

/// Trimmed transcripts, keyed and ordered like the input.
pub type OutputBlocks = IndexMap<String, String>;

/// Runs input blocks through a fresh interpreter process.
///
/// A driver holds only configuration; every [`run`](Self::run) spawns its
/// own child, so one driver can serve many documents, concurrently if
/// needed.
#[derive(Debug, Clone)]
pub struct SessionDriver {
    config: SessionConfig,
}

impl SessionDriver {
    /// Create a driver from a built configuration.
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// The configuration every run uses.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Spawn the interpreter in a PTY and run `blocks` through it.
    pub async fn run(&self, blocks: &InputBlocks) -> Result<SessionOutput> {
        let input = self.prepare(blocks)?;
        let session = Session::spawn(&self.config)?;
        self.drive(session, &input).await
    }

    /// Run `blocks` over an already running transport.
    pub async fn run_with_transport<T: Transport>(
        &self,
        transport: T,
        blocks: &InputBlocks,
    ) -> Result<SessionOutput> {
        let input = self.prepare(blocks)?;
        let session = Session::with_transport(transport, &self.config)?;
        self.drive(session, &input).await
    }

    /// Append the variable dump block when recording is on.
    fn prepare<'a>(&self, blocks: &'a InputBlocks) -> Result<Cow<'a, InputBlocks>> {
        match &self.config.vars_artifact {
            Some(path) => Ok(Cow::Owned(inject_variable_dump(
                blocks,
                &self.config.variant,
                path,
            )?)),
            None => Ok(Cow::Borrowed(blocks)),
        }
    }

    async fn drive<T: Transport>(
        &self,
        mut session: Session<T>,
        input: &InputBlocks,
    ) -> Result<SessionOutput> {
        let carry = session.synchronize().await?;
        let mut outputs = session.process_blocks(input, carry).await?;

        if self.config.vars_artifact.is_some() {
            outputs.shift_remove(SAVE_VARS_KEY);
        }

        let mut output = session.finish(outputs).await?;
        output.vars_artifact = self.config.vars_artifact.clone();

        info!(
            "{} session finished: {} blocks, {}",
            self.config.variant.name,
            output.blocks.len(),
            output.exit_status
        );
        debug!("output keys: {:?}", output.blocks.keys().collect::<Vec<_>>());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::error::{ConfigError, Error, SessionError};
    use crate::transport::scripted::ScriptedTransport;
    use crate::variant::Variant;

    fn blocks(pairs: &[(&str, &str)]) -> InputBlocks {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn echo_variant() -> Variant {
        Variant::new("echo", "fake-repl")
            .with_prompt(">>>")
            .with_bare_prompt(true)
            .with_dump_template("dump({path})")
    }

    fn echo(line: &str) -> String {
        if line.is_empty() {
            String::new()
        } else {
            format!("= {line}")
        }
    }

    #[tokio::test]
    async fn test_keys_preserved_in_order() {
        let driver = SessionBuilder::with_variant(echo_variant())
            .build_driver()
            .unwrap();
        let input = blocks(&[("zeta", "z"), ("alpha", "a\nb"), ("mid", "")]);

        let output = assert_ok!(
            driver
                .run_with_transport(ScriptedTransport::repl(">>> ", echo), &input)
                .await
        );

        let keys: Vec<_> = output.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(output.get("zeta"), Some(">>> z\r\n= z"));
        assert_eq!(output.get("alpha"), Some("\r\n>>> a\r\n= a\r\n>>> b\r\n= b"));
        assert_eq!(output.get("mid"), Some(""));
        assert!(output.is_clean());
        assert_eq!(output.vars_artifact, None);
    }

    #[tokio::test]
    async fn test_vars_block_sent_but_not_returned() {
        let driver = SessionBuilder::with_variant(echo_variant())
            .record_vars("/tmp/doc-vars.json")
            .build_driver()
            .unwrap();
        let transport = ScriptedTransport::repl(">>> ", echo);
        let written = transport.written();

        let output = driver
            .run_with_transport(transport, &blocks(&[("a", "x")]))
            .await
            .unwrap();

        assert_eq!(output.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(
            output.vars_artifact.as_deref(),
            Some(std::path::Path::new("/tmp/doc-vars.json"))
        );
        assert!(
            written
                .lock()
                .unwrap()
                .iter()
                .any(|line| line == "dump(/tmp/doc-vars.json)")
        );
    }

    #[tokio::test]
    async fn test_reserved_key_rejected_before_running() {
        let driver = SessionBuilder::with_variant(echo_variant())
            .record_vars("/tmp/v.json")
            .build_driver()
            .unwrap();
        let transport = ScriptedTransport::repl(">>> ", echo);
        let written = transport.written();

        let err = driver
            .run_with_transport(transport, &blocks(&[(SAVE_VARS_KEY, "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidConfig { .. })));
        assert!(written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_strict_exit_keeps_outputs() {
        let driver = SessionBuilder::with_variant(echo_variant())
            .build_driver()
            .unwrap();
        let transport = ScriptedTransport::repl(">>> ", echo).with_exit_code(1);

        let err = assert_err!(
            driver
                .run_with_transport(transport, &blocks(&[("a", "x")]))
                .await
        );
        assert!(matches!(err, Error::Session(SessionError::Exit { .. })));
        assert_eq!(err.outputs().unwrap()["a"], ">>> x\r\n= x");
    }

    #[cfg(unix)]
    mod pty {
        use super::*;

        const EVAL_LOOP: &str = "/bin/sh -c 'printf \"> \"; \
            while IFS= read -r line; do eval \"$line\"; printf \"> \"; done'";

        fn shell_variant(command: &str) -> Variant {
            Variant::new("sh", command)
                .with_prompt(">")
                .with_trim_prompt(">")
                .with_bare_prompt(true)
                .with_dump_template("printf '{\"x\": %s}' \"$x\" | tee {path}")
        }

        #[tokio::test]
        async fn test_shell_end_to_end() {
            let _ = env_logger::builder().is_test(true).try_init();
            let driver = SessionBuilder::with_variant(shell_variant(EVAL_LOOP))
                .timeout(Duration::from_secs(5))
                .build_driver()
                .unwrap();

            let output = driver
                .run(&blocks(&[("a", "echo out:a"), ("b", "true")]))
                .await
                .unwrap();

            assert_eq!(output.get("a"), Some("> echo out:a\r\nout:a"));
            assert_eq!(output.get("b"), Some("\r\n> true"));
            assert!(output.exit_status.success());
        }

        #[tokio::test]
        async fn test_shell_records_vars() {
            let dir = tempfile::tempdir().unwrap();
            let artifact = dir.path().join(vars_artifact_name("doc"));
            let driver = SessionBuilder::with_variant(shell_variant(EVAL_LOOP))
                .timeout(Duration::from_secs(5))
                .record_vars(&artifact)
                .build_driver()
                .unwrap();

            let output = driver.run(&blocks(&[("a", "x=1")])).await.unwrap();

            assert_eq!(output.keys().collect::<Vec<_>>(), vec!["a"]);
            let written = std::fs::read_to_string(&artifact).unwrap();
            assert_eq!(written, "{\"x\": 1}");
        }

        #[tokio::test]
        async fn test_shell_carriage_return_splits_units() {
            let driver = SessionBuilder::with_variant(shell_variant(EVAL_LOOP))
                .timeout(Duration::from_secs(5))
                .build_driver()
                .unwrap();

            let output = driver
                .run(&blocks(&[("a", "echo one\recho two"), ("b", "echo three")]))
                .await
                .unwrap();

            assert_eq!(
                output.get("a"),
                Some("> echo one\r\none\r\n> echo two\r\ntwo")
            );
            assert_eq!(output.get("b"), Some("\r\n> echo three\r\nthree"));
        }

        #[tokio::test]
        async fn test_python_records_user_variables() {
            let available = std::process::Command::new("python3")
                .arg("--version")
                .output()
                .is_ok_and(|out| out.status.success());
            if !available {
                return;
            }

            let dir = tempfile::tempdir().unwrap();
            let artifact = dir.path().join(vars_artifact_name("analysis.py"));
            let driver = SessionBuilder::new("python")
                .command("python3")
                .env("PYTHON_BASIC_REPL", "1")
                .timeout(Duration::from_secs(10))
                .record_vars(&artifact)
                .build_driver()
                .unwrap();

            let output = driver
                .run(&blocks(&[("setup", "x = 1\nname = 'ada'")]))
                .await
                .unwrap();
            assert_eq!(output.keys().collect::<Vec<_>>(), vec!["setup"]);

            let text = std::fs::read_to_string(&artifact).unwrap();
            let vars: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(vars["x"], "1");
            assert_eq!(vars["name"], "ada");
        }

        #[tokio::test]
        async fn test_shell_exit_status_policy() {
            let command = "/bin/sh -c 'printf \"> \"; \
                while IFS= read -r line; do printf \"> \"; done; exit 3'";

            let strict = SessionBuilder::with_variant(shell_variant(command))
                .timeout(Duration::from_secs(5))
                .build_driver()
                .unwrap();
            let err = strict.run(&blocks(&[("a", "x")])).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Session(SessionError::Exit { ref status, .. }) if status.code == 3
            ));

            let lenient = SessionBuilder::with_variant(shell_variant(command))
                .timeout(Duration::from_secs(5))
                .lenient()
                .build_driver()
                .unwrap();
            let output = lenient.run(&blocks(&[("a", "x")])).await.unwrap();
            assert_eq!(output.exit_status.code, 3);
            assert_eq!(output.warnings.len(), 1);
            assert_eq!(output.get("a"), Some("> x"));
        }

        #[tokio::test]
        async fn test_shell_without_prompt_times_out() {
            let driver = SessionBuilder::with_variant(shell_variant("sleep 5"))
                .timeout(Duration::from_millis(200))
                .build_driver()
                .unwrap();

            let err = driver.run(&blocks(&[("a", "x")])).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Session(SessionError::Timeout { block: None, .. })
            ));
        }

        #[tokio::test]
        async fn test_missing_interpreter_fails_to_start() {
            let driver = SessionBuilder::with_variant(shell_variant(
                "/nonexistent/linewise-interpreter",
            ))
            .build_driver()
            .unwrap();

            let err = driver.run(&blocks(&[("a", "x")])).await.unwrap_err();
            assert!(matches!(err, Error::Session(SessionError::Start { .. })));
        }
    }
}
