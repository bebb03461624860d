//! Rhino JavaScript shell.

use crate::variant::Variant;

/// Create the Rhino variant.
pub fn variant() -> Variant {
    Variant::new("rhino", "rhino")
        .with_alias("jsint")
        .with_prompt("js> ")
        .with_trim_prompt("js>")
        .with_extensions(&[".js"], &[".txt"])
}
