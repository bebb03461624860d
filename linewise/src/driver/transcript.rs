//! Per-block transcript accumulation and trimming.
//!
//! Carry text is threaded explicitly: every expectation step takes the
//! pending [`Carry`] and hands back the next one, so a fragment can never be
//! attributed to two blocks.

use bytes::Bytes;
use regex::Regex;

use crate::channel::Expectation;
use crate::error::Result;
use crate::variant::Variant;

/// Matched prompt text not yet attributed to any block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Carry(Vec<u8>);

impl Carry {
    /// No carried text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The text an initial synchronization leaves for the first block:
    /// everything before the first prompt plus the prompt itself.
    pub fn from_greeting(exp: &Expectation) -> Self {
        let mut text = Vec::with_capacity(exp.before.len() + exp.after.len());
        text.extend_from_slice(&exp.before);
        text.extend_from_slice(&exp.after);
        Self(text)
    }

    /// Get the carried bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if nothing is carried.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Bytes> for Carry {
    fn from(bytes: Bytes) -> Self {
        Self(bytes.to_vec())
    }
}

/// Raw transcript of one block under construction.
#[derive(Debug, Clone)]
pub struct BlockTranscript {
    key: String,
    text: Vec<u8>,
}

impl BlockTranscript {
    /// Start a block's transcript with the carry left by the previous block.
    pub fn begin(key: impl Into<String>, carry: Carry) -> Self {
        Self {
            key: key.into(),
            text: carry.0,
        }
    }

    /// Record one expectation.
    ///
    /// `pending` (the previous unit's prompt) is appended first, then the
    /// output before this match. The matched prompt is returned as the new
    /// pending carry; whoever handles the next unit or block owns it.
    pub fn absorb(&mut self, pending: Carry, exp: Expectation) -> Carry {
        self.text.extend_from_slice(&pending.0);
        self.text.extend_from_slice(&exp.before);
        Carry::from(exp.after)
    }

    /// The block key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw bytes accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    /// Accumulated text (lossy UTF-8 conversion).
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.text).into_owned()
    }
}

/// Strips trailing prompt echoes and blank lines from a transcript.
#[derive(Debug, Clone)]
pub struct TranscriptTrimmer {
    line_ending: String,
    trim: Regex,
}

impl TranscriptTrimmer {
    /// Create a trimmer from a whole-line trim regex.
    pub fn new(trim: Regex, line_ending: impl Into<String>) -> Self {
        Self {
            line_ending: line_ending.into(),
            trim,
        }
    }

    /// Create the trimmer for a variant.
    pub fn for_variant(variant: &Variant) -> Result<Self> {
        Ok(Self::new(variant.trim_regex()?, variant.line_ending.clone()))
    }

    /// Drop trailing lines that are blank or only a prompt echo.
    ///
    /// Blank lines the program printed at the very end of a block are
    /// dropped as well.
    pub fn trim(&self, text: &str) -> String {
        let mut lines: Vec<&str> = text.split(self.line_ending.as_str()).collect();
        while let Some(last) = lines.last() {
            if last.trim().is_empty() || self.trim.is_match(last) {
                lines.pop();
            } else {
                break;
            }
        }
        lines.join(&self.line_ending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(before: &'static str, after: &'static str) -> Expectation {
        Expectation {
            before: Bytes::from_static(before.as_bytes()),
            after: Bytes::from_static(after.as_bytes()),
            term: 0,
        }
    }

    fn python_trimmer() -> TranscriptTrimmer {
        TranscriptTrimmer::for_variant(&Variant::new("py", "python")).unwrap()
    }

    #[test]
    fn test_carry_threads_between_units() {
        let greeting = Carry::from_greeting(&exp("", ">>>"));
        let mut block = BlockTranscript::begin("a", greeting);

        let pending = block.absorb(Carry::empty(), exp(" 1+1\r\n2", "\r\n>>>"));
        assert_eq!(pending.as_bytes(), b"\r\n>>>");

        let next = block.absorb(pending, exp(" ", "\r\n>>>"));
        assert_eq!(block.to_string_lossy(), ">>> 1+1\r\n2\r\n>>> ");

        // The last prompt belongs to whatever comes next, not this block.
        assert_eq!(next.as_bytes(), b"\r\n>>>");
        assert_eq!(block.key(), "a");
    }

    #[test]
    fn test_trim_drops_prompt_and_blank_lines() {
        let trimmer = python_trimmer();
        assert_eq!(trimmer.trim(">>> 1+1\r\n2\r\n>>> "), ">>> 1+1\r\n2");
        assert_eq!(trimmer.trim("out\r\n\r\n   \r\n>>>\r\n>>> "), "out");
    }

    #[test]
    fn test_trim_keeps_prompt_with_code() {
        let trimmer = python_trimmer();
        assert_eq!(trimmer.trim(">>> x = 1"), ">>> x = 1");
    }

    #[test]
    fn test_trim_everything() {
        let trimmer = python_trimmer();
        assert_eq!(trimmer.trim(""), "");
        assert_eq!(trimmer.trim(">>> \r\n>>> "), "");
    }

    #[test]
    fn test_trim_drops_trailing_blank_program_output() {
        // Kept for compatibility: blank output lines at the end go too.
        let trimmer = python_trimmer();
        assert_eq!(trimmer.trim("a\r\n\r\n>>> "), "a");
    }

    #[test]
    fn test_trim_is_idempotent() {
        let trimmer = python_trimmer();
        let samples = [
            "",
            ">>> ",
            ">>> 1+1\r\n2\r\n>>> ",
            "\r\n\r\n",
            "x\r\n  \r\n>>>",
            "a\nb\r\n>>> c\r\n...",
            "   ",
        ];
        for text in samples {
            let once = trimmer.trim(text);
            assert_eq!(trimmer.trim(&once), once, "text: {text:?}");
        }
    }

    #[test]
    fn test_trim_uses_variant_line_ending() {
        let variant = Variant::new("r", "R")
            .with_line_ending("\n")
            .with_trim_prompt(">");
        let trimmer = TranscriptTrimmer::for_variant(&variant).unwrap();
        assert_eq!(trimmer.trim("> 1 + 1\n[1] 2\n> "), "> 1 + 1\n[1] 2");
    }
}
