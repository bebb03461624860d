//! Expect buffer with incremental search.
//!
//! Output accumulates here until a search term shows up. Bytes already
//! scanned without a hit are not scanned again: a later search only starts
//! `longest term - 1` bytes before the old end, which is the furthest back a
//! match that straddles a chunk boundary can begin.

use bytes::{Bytes, BytesMut};

use super::patterns::{SearchTerms, TermMatch};

/// Text consumed by one expectation match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Everything the child printed before the matched term.
    pub before: Bytes,

    /// The matched term itself.
    pub after: Bytes,

    /// Index of the matched term.
    pub term: usize,
}

/// Buffer for unmatched child output.
#[derive(Debug, Default)]
pub struct ExpectBuffer {
    /// Output not yet attributed to any expectation.
    buffer: BytesMut,

    /// Prefix length already searched without a match.
    scanned: usize,
}

impl ExpectBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            scanned: 0,
        }
    }

    /// Append raw output. Bytes are kept verbatim.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Search the unscanned region for the earliest term.
    pub fn search(&mut self, terms: &SearchTerms) -> Option<TermMatch> {
        let from = self
            .scanned
            .saturating_sub(terms.longest().saturating_sub(1));
        match terms.find(&self.buffer[from..]) {
            Some(m) => Some(TermMatch {
                start: m.start + from,
                end: m.end + from,
                index: m.index,
            }),
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Split off everything up to the end of `m`.
    ///
    /// Bytes after the match stay buffered for the next expectation.
    pub fn consume(&mut self, m: TermMatch) -> Expectation {
        let before = self.buffer.split_to(m.start).freeze();
        let after = self.buffer.split_to(m.end - m.start).freeze();
        self.scanned = 0;
        Expectation {
            before,
            after,
            term: m.index,
        }
    }

    /// Search and consume in one step.
    pub fn take_match(&mut self, terms: &SearchTerms) -> Option<Expectation> {
        self.search(terms).map(|m| self.consume(m))
    }

    /// Unmatched output currently buffered.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Unmatched output as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
