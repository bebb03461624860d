//! Built-in interpreter variants.

pub mod clojure;
pub mod python;
pub mod r;
pub mod rhino;

use super::Variant;

/// All built-in variants, in registration order.
pub fn builtin() -> Vec<Variant> {
    vec![
        python::variant(),
        r::variant(),
        rhino::variant(),
        clojure::variant(),
    ]
}
