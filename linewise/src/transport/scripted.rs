//! In-memory transport that plays a scripted interpreter, for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ExitStatus, Transport};
use crate::error::{Result, TransportError};

type Responder = Box<dyn FnMut(&str) -> Vec<Vec<u8>> + Send>;

/// A fake interpreter: emits a greeting, then answers each written line
/// with whatever the responder returns.
pub(crate) struct ScriptedTransport {
    pending: VecDeque<Vec<u8>>,
    responder: Responder,
    written: Arc<Mutex<Vec<String>>>,
    emitted: Arc<Mutex<Vec<u8>>>,
    exit_code: u32,
    hang_on_close: bool,
    eof_after_drain: bool,
    stall_writes: bool,
    killed: Arc<AtomicBool>,
}

impl ScriptedTransport {
    pub(crate) fn new(
        greeting: &[&str],
        responder: impl FnMut(&str) -> Vec<Vec<u8>> + Send + 'static,
    ) -> Self {
        Self {
            pending: greeting.iter().map(|s| s.as_bytes().to_vec()).collect(),
            responder: Box::new(responder),
            written: Arc::default(),
            emitted: Arc::default(),
            exit_code: 0,
            hang_on_close: false,
            eof_after_drain: false,
            stall_writes: false,
            killed: Arc::default(),
        }
    }

    /// A REPL that echoes each line, prints `eval(line)` if non-empty, and
    /// prompts again. Mirrors what a PTY with echo enabled produces.
    pub(crate) fn repl(prompt: &'static str, eval: fn(&str) -> String) -> Self {
        Self::new(&[prompt], move |line| {
            let result = eval(line);
            let mut out = format!("{line}\r\n");
            if !result.is_empty() {
                out.push_str(&result);
                out.push_str("\r\n");
            }
            out.push_str(prompt);
            vec![out.into_bytes()]
        })
    }

    pub(crate) fn with_exit_code(mut self, code: u32) -> Self {
        self.exit_code = code;
        self
    }

    pub(crate) fn hang_on_close(mut self) -> Self {
        self.hang_on_close = true;
        self
    }

    /// Report EOF instead of blocking once all scripted output is consumed.
    pub(crate) fn eof_after_drain(mut self) -> Self {
        self.eof_after_drain = true;
        self
    }

    /// Never complete a write, like a child that stopped reading its input.
    pub(crate) fn stall_writes(mut self) -> Self {
        self.stall_writes = true;
        self
    }

    /// Lines written so far, without their trailing newline.
    pub(crate) fn written(&self) -> Arc<Mutex<Vec<String>>> {
        self.written.clone()
    }

    /// Set once `kill` has been called.
    pub(crate) fn killed(&self) -> Arc<AtomicBool> {
        self.killed.clone()
    }

    /// Every byte handed out through `read_chunk`, in order.
    pub(crate) fn emitted(&self) -> Arc<Mutex<Vec<u8>>> {
        self.emitted.clone()
    }
}

impl Transport for ScriptedTransport {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.stall_writes {
            return std::future::pending::<Result<()>>().await;
        }
        let text = String::from_utf8_lossy(data);
        let line = text.strip_suffix('\n').unwrap_or(&text).to_string();
        self.pending.extend((self.responder)(&line));
        self.written.lock().unwrap().push(line);
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(chunk) = self.pending.pop_front() {
            self.emitted.lock().unwrap().extend_from_slice(&chunk);
            return Ok(Some(chunk));
        }
        if self.eof_after_drain || self.killed.load(Ordering::SeqCst) {
            return Ok(None);
        }
        std::future::pending::<Result<Option<Vec<u8>>>>().await
    }

    async fn close(&mut self, timeout: Duration) -> Result<ExitStatus> {
        if self.hang_on_close {
            return Err(TransportError::CloseTimeout {
                pid: self.pid(),
                timeout,
            }
            .into());
        }
        Ok(ExitStatus::with_code(self.exit_code))
    }

    fn kill(&mut self) -> Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
