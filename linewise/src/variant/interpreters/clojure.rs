//! Clojure REPL.
//!
//! Multi-line forms are sent as one unit: indented continuation lines are
//! merged onto the line that opened the form.

use crate::variant::{LineSplitter, Variant};

/// Create the Clojure variant.
pub fn variant() -> Variant {
    Variant::new("clojure", "clojure -r")
        .with_alias("clj")
        .with_alias("cljint")
        .with_prompt("user=> ")
        .with_trim_prompt("user=>")
        .with_splitter(LineSplitter::Indented)
        .with_extensions(&[".clj", ".txt"], &[".txt"])
}
