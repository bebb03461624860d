//! Send/expect channel over a [`Transport`].

use std::time::Duration;

use log::{debug, trace};

use super::buffer::{ExpectBuffer, Expectation};
use super::patterns::SearchTerms;
use crate::error::{ChannelError, Result};
use crate::transport::Transport;

/// Pairs a transport with an expect buffer and a fixed set of search terms.
///
/// Matching is strictly one expectation at a time: each call to
/// [`expect`](Self::expect) consumes output up to the first search term and
/// leaves the rest buffered.
pub struct ExpectChannel<T> {
    transport: T,
    buffer: ExpectBuffer,
    terms: SearchTerms,
    eof: bool,
}

impl<T: Transport> ExpectChannel<T> {
    /// Create a channel that waits for `terms` on `transport`.
    pub fn new(transport: T, terms: SearchTerms) -> Self {
        Self {
            transport,
            buffer: ExpectBuffer::new(),
            terms,
            eof: false,
        }
    }

    /// Write a submission unit followed by `newline`.
    pub async fn send_line(&mut self, unit: &str, newline: &str) -> Result<()> {
        debug!("send: {:?}", unit);
        let mut data = Vec::with_capacity(unit.len() + newline.len());
        data.extend_from_slice(unit.as_bytes());
        data.extend_from_slice(newline.as_bytes());
        self.transport.write(&data).await
    }

    /// Wait up to `timeout` for the next search term.
    ///
    /// On failure the unmatched output stays in the buffer, see
    /// [`pending`](Self::pending).
    pub async fn expect(&mut self, timeout: Duration) -> Result<Expectation> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(exp) = self.buffer.take_match(&self.terms) {
                trace!(
                    "matched {:?} after {} bytes",
                    self.terms.terms()[exp.term],
                    exp.before.len()
                );
                return Ok(exp);
            }

            if self.eof {
                return Err(ChannelError::Closed.into());
            }

            match tokio::time::timeout_at(deadline, self.transport.read_chunk()).await {
                Err(_) => return Err(ChannelError::PatternTimeout(timeout).into()),
                Ok(chunk) => match chunk? {
                    Some(data) => self.buffer.extend(&data),
                    None => {
                        debug!("output stream closed");
                        self.eof = true;
                    }
                },
            }
        }
    }

    /// Output received but not yet matched.
    pub fn pending(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// The search terms this channel waits for.
    pub fn terms(&self) -> &SearchTerms {
        &self.terms
    }

    /// Whether the child has closed its output.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
