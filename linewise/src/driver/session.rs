//! The send/expect state machine for one interpreter process.
//!
//! A session moves through
//! `NotStarted -> Spawning -> AwaitingInitialPrompt -> ProcessingBlocks ->
//! Closing -> Closed`, or to `Failed` from any running state. The first two
//! happen inside [`Session::spawn`]; a `Session` value always starts out in
//! `AwaitingInitialPrompt`.
//!
//! Each submission unit gets exactly one expectation; nothing is pipelined,
//! since output can only be attributed to the input that was sent last.

use std::fmt;
use std::time::Duration;

use log::{debug, warn};

use super::InputBlocks;
use super::OutputBlocks;
use super::builder::SessionConfig;
use super::output::{ExitPolicy, SessionOutput};
use super::transcript::{BlockTranscript, Carry, TranscriptTrimmer};
use crate::channel::{ExpectChannel, Expectation};
use crate::error::{ChannelError, Error, Result, SessionError};
use crate::transport::{ExitStatus, PtyTransport, Transport};
use crate::variant::LineSplitter;

/// Lifecycle state of a [`Session`].
///
/// `NotStarted` and `Spawning` are only ever logged, never held by a
/// `Session`: a failed spawn leaves no session behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Spawning,
    AwaitingInitialPrompt,
    ProcessingBlocks,
    Closing,
    Closed,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::NotStarted => "NotStarted",
            SessionState::Spawning => "Spawning",
            SessionState::AwaitingInitialPrompt => "AwaitingInitialPrompt",
            SessionState::ProcessingBlocks => "ProcessingBlocks",
            SessionState::Closing => "Closing",
            SessionState::Closed => "Closed",
            SessionState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// A live interpreter process and the state of the conversation with it.
pub struct Session<T> {
    channel: ExpectChannel<T>,
    splitter: LineSplitter,
    newline: String,
    trimmer: TranscriptTrimmer,
    timeout: Duration,
    close_timeout: Duration,
    exit_policy: ExitPolicy,
    command: String,
    state: SessionState,
}

impl Session<PtyTransport> {
    /// Spawn the configured interpreter in a PTY.
    pub fn spawn(config: &SessionConfig) -> Result<Self> {
        debug!(
            "session: {} -> {} ({:?})",
            SessionState::NotStarted,
            SessionState::Spawning,
            config.spawn.command
        );
        let transport = PtyTransport::spawn(&config.spawn).map_err(|e| SessionError::Start {
            command: config.spawn.command.clone(),
            message: e.to_string(),
        })?;
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> Session<T> {
    /// Wrap an already running transport.
    pub fn with_transport(transport: T, config: &SessionConfig) -> Result<Self> {
        let trimmer = TranscriptTrimmer::for_variant(&config.variant)?;
        let channel = ExpectChannel::new(transport, config.variant.search_terms());
        debug!(
            "session {:?}: {} -> {}, search terms {:?}",
            channel.transport().pid(),
            SessionState::Spawning,
            SessionState::AwaitingInitialPrompt,
            channel.terms().terms()
        );

        Ok(Self {
            channel,
            splitter: config.variant.splitter,
            newline: config.variant.newline.clone(),
            trimmer,
            timeout: config.timeout,
            close_timeout: config.close_timeout,
            exit_policy: config.exit_policy,
            command: config.spawn.command.clone(),
            state: SessionState::AwaitingInitialPrompt,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Process id of the interpreter.
    pub fn pid(&self) -> Option<u32> {
        self.channel.transport().pid()
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    fn require(&self, expected: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(SessionError::InvalidState {
                expected: match expected {
                    SessionState::AwaitingInitialPrompt => "AwaitingInitialPrompt",
                    SessionState::ProcessingBlocks => "ProcessingBlocks",
                    _ => "a running session",
                },
                actual: self.state.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn set_state(&mut self, next: SessionState) {
        debug!("session {:?}: {} -> {}", self.pid(), self.state, next);
        self.state = next;
    }

    /// Kill the child and mark the session failed.
    fn fail(&mut self) {
        if let Err(e) = self.channel.transport_mut().kill() {
            warn!("failed to kill pid {:?}: {}", self.pid(), e);
        }
        self.set_state(SessionState::Failed);
    }

    /// Wait for the first prompt.
    ///
    /// Everything up to and including it is returned as the carry for the
    /// first block.
    pub async fn synchronize(&mut self) -> Result<Carry> {
        self.require(SessionState::AwaitingInitialPrompt)?;

        match self.channel.expect(self.timeout).await {
            Ok(exp) => {
                self.set_state(SessionState::ProcessingBlocks);
                Ok(Carry::from_greeting(&exp))
            }
            Err(err) => {
                let partial = String::from_utf8_lossy(self.channel.pending()).into_owned();
                self.fail();
                Err(match err {
                    Error::Channel(ChannelError::PatternTimeout(timeout)) => {
                        SessionError::Timeout {
                            block: None,
                            partial,
                            timeout,
                        }
                        .into()
                    }
                    Error::Channel(ChannelError::Closed) => SessionError::Start {
                        command: self.command.clone(),
                        message: format!("process exited before its first prompt: {partial:?}"),
                    }
                    .into(),
                    other => other,
                })
            }
        }
    }

    /// Send one submission unit and wait for the next prompt.
    ///
    /// The write and the wait are each bounded by the session timeout.
    pub async fn exchange(&mut self, unit: &str) -> Result<Expectation> {
        let send = self.channel.send_line(unit, &self.newline);
        match tokio::time::timeout(self.timeout, send).await {
            Ok(sent) => sent?,
            Err(_) => {
                debug!("write of {:?} not accepted within {:?}", unit, self.timeout);
                return Err(ChannelError::PatternTimeout(self.timeout).into());
            }
        }
        self.channel.expect(self.timeout).await
    }

    /// Run one block through the interpreter.
    ///
    /// Returns the trimmed transcript and the carry for the next block.
    pub async fn process_block(
        &mut self,
        key: &str,
        text: &str,
        carry: Carry,
    ) -> Result<(String, Carry)> {
        self.require(SessionState::ProcessingBlocks)?;
        debug!("block {:?}", key);

        let mut transcript = BlockTranscript::begin(key, carry);
        let mut pending = Carry::empty();

        for unit in self.splitter.split(text) {
            match self.exchange(&unit).await {
                Ok(exp) => pending = transcript.absorb(pending, exp),
                Err(err) => return Err(self.block_failure(err, &transcript, &pending)),
            }
        }

        let output = self.trimmer.trim(&transcript.to_string_lossy());
        Ok((output, pending))
    }

    /// Turn a mid-block error into a session error with diagnostics.
    fn block_failure(&mut self, err: Error, transcript: &BlockTranscript, pending: &Carry) -> Error {
        let mut raw = transcript.as_bytes().to_vec();
        raw.extend_from_slice(pending.as_bytes());
        raw.extend_from_slice(self.channel.pending());
        let partial = String::from_utf8_lossy(&raw).into_owned();
        let block = transcript.key().to_string();

        self.fail();

        match err {
            Error::Channel(ChannelError::PatternTimeout(timeout)) => SessionError::Timeout {
                block: Some(block),
                partial,
                timeout,
            }
            .into(),
            Error::Channel(ChannelError::Closed) => {
                SessionError::UnexpectedEof { block, partial }.into()
            }
            other => other,
        }
    }

    /// Run every block in order, threading the carry from block to block.
    pub async fn process_blocks(
        &mut self,
        blocks: &InputBlocks,
        carry: Carry,
    ) -> Result<OutputBlocks> {
        let mut outputs = OutputBlocks::with_capacity(blocks.len());
        let mut carry = carry;
        for (key, text) in blocks {
            let (output, next) = self.process_block(key, text, carry).await?;
            outputs.insert(key.clone(), output);
            carry = next;
        }
        Ok(outputs)
    }

    /// Close the interpreter's input and wait for it to exit.
    ///
    /// If it is still running when the close timeout expires it is killed
    /// and the session is marked failed.
    pub async fn close(&mut self) -> Result<ExitStatus> {
        self.require(SessionState::ProcessingBlocks)?;
        self.set_state(SessionState::Closing);

        match self.channel.transport_mut().close(self.close_timeout).await {
            Ok(status) => {
                self.set_state(SessionState::Closed);
                Ok(status)
            }
            Err(e) => {
                warn!("pid {:?} did not close: {}", self.pid(), e);
                self.fail();
                Err(e)
            }
        }
    }

    /// Close the interpreter and apply the exit policy.
    ///
    /// `outputs` is handed back either in the result or inside the error, so
    /// nothing collected is lost on a failed close or non-zero exit.
    pub async fn finish(&mut self, outputs: OutputBlocks) -> Result<SessionOutput> {
        let status = match self.close().await {
            Ok(status) => status,
            Err(_) if self.state == SessionState::Failed => {
                return Err(SessionError::Close {
                    pid: self.pid(),
                    outputs,
                }
                .into());
            }
            Err(e) => return Err(e),
        };

        let mut warnings = Vec::new();
        if !status.success() {
            match self.exit_policy {
                ExitPolicy::Strict => return Err(SessionError::Exit { status, outputs }.into()),
                ExitPolicy::Lenient => {
                    let message = format!("'{}' exited with {}", self.command, status);
                    warn!("{}", message);
                    warnings.push(message);
                }
            }
        }

        Ok(SessionOutput {
            blocks: outputs,
            exit_status: status,
            vars_artifact: None,
            warnings,
        })
    }
}
