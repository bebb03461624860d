//! Line-splitting strategies.
//!
//! A splitter decides how one input block is chopped into submission units.
//! Each unit is written to the interpreter verbatim, followed by a single
//! newline, and answered by exactly one prompt.

use serde::{Deserialize, Serialize};

/// How an input block is divided into submission units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSplitter {
    /// One unit per physical line, plus a trailing empty unit that makes the
    /// interpreter finish any statement still open at the end of the block.
    #[default]
    Default,

    /// A line with leading whitespace joins the unit opened by the last
    /// unindented line. For interpreters whose multi-line forms are
    /// delimited by indentation rather than brackets.
    Indented,
}

impl LineSplitter {
    /// Split `text` into submission units.
    pub fn split(&self, text: &str) -> Vec<String> {
        match self {
            LineSplitter::Default => split_lines(text),
            LineSplitter::Indented => split_indented(text),
        }
    }
}

/// Whether `c` ends a line. Besides `\n` and `\r` this covers the other
/// separators interpreters such as Python treat as line boundaries.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every line boundary, `\r\n` counting as one.
///
/// A bare `\r` must split too: the terminal turns it into a newline, and the
/// interpreter answers it with a prompt of its own.
fn physical_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' && chars.next_if(|&(_, next)| next == '\n').is_some() {
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn split_lines(text: &str) -> Vec<String> {
    physical_lines(text)
        .into_iter()
        .map(str::to_string)
        .chain(std::iter::once(String::new()))
        .collect()
}

fn split_indented(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in physical_lines(text) {
        if line.starts_with(char::is_whitespace) {
            current.push(line);
        } else {
            if !current.is_empty() {
                units.push(current.join("\n"));
            }
            current = vec![line];
        }
    }

    // Always flushed, even when the block is empty.
    units.push(current.join("\n"));
    units
}
