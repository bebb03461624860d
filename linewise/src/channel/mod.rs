//! Channel layer for prompt matching over the child's output stream.
//!
//! This module turns a raw byte stream into a sequence of expectations:
//! the text before a prompt, and the prompt itself.

mod buffer;
mod expect;
mod patterns;

pub use buffer::{ExpectBuffer, Expectation};
pub use expect::ExpectChannel;
pub use patterns::{SearchTerms, TermMatch};
