//! # linewise
//!
//! Drive interactive interpreters through a pseudo-terminal and slice their
//! output into per-section transcripts.
//!
//! A document is a sequence of named input blocks. linewise starts one
//! interpreter (Python, R, Rhino, Clojure, or anything with a recognizable
//! prompt), feeds it each block one submission unit at a time, waits for the
//! prompt after every unit and returns what the terminal showed, block by
//! block, exactly as a user typing it would have seen it.
//!
//! ## Features
//!
//! - Async PTY sessions via portable-pty and tokio
//! - Literal prompt matching with per-expectation deadlines
//! - Built-in interpreter variants, extensible at runtime or from JSON
//! - Optional variable dump to a JSON side artifact
//! - Strict or lenient handling of the interpreter's exit status
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linewise::{InputBlocks, SessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), linewise::Error> {
//!     let driver = SessionBuilder::new("python").build_driver()?;
//!
//!     let mut blocks = InputBlocks::new();
//!     blocks.insert("setup".to_string(), "x = 20".to_string());
//!     blocks.insert("answer".to_string(), "x * 2 + 2".to_string());
//!
//!     let output = driver.run(&blocks).await?;
//!     for (key, transcript) in &output.blocks {
//!         println!("--- {key}\n{transcript}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod transport;
pub mod variant;

// Re-export main types for convenience
pub use driver::{
    ExitPolicy, InputBlocks, OutputBlocks, Session, SessionBuilder, SessionConfig, SessionDriver,
    SessionOutput, SessionState,
};
pub use error::{Error, Result};
pub use transport::{ExitStatus, PtyTransport, SpawnConfig, Transport};
pub use variant::{LineSplitter, Variant, VariantRegistry};
