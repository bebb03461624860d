//! Python interactive interpreter.
//!
//! Python prompts `>>>` normally and `...` inside multi-line statements such
//! as loops, so both are search terms. The blank unit appended by the default
//! splitter closes any compound statement left open at the end of a block.
//!
//! Prompts only match after a line ending, so the startup banner has to be
//! printed: `python -q` opens with a bare `>>> ` and never synchronizes.

use crate::variant::Variant;

/// Writes `locals()` as JSON, stringifying every value.
///
/// The loop runs over a snapshot: its own loop variables land in `locals()`
/// while it iterates.
const DUMP_VARS: &str = r#"import json
linewise__vars_file = open("{path}", "w")
linewise__x = {}
for linewise__k, linewise__v in list(locals().items()):
    linewise__x[linewise__k] = str(linewise__v)

json.dump(linewise__x, linewise__vars_file)
linewise__vars_file.close()
"#;

/// Create the Python variant.
pub fn variant() -> Variant {
    Variant::new("python", "python")
        .with_alias("pycon")
        .with_prompts([">>>", "..."])
        .with_trim_prompt(">>>")
        .with_dump_template(DUMP_VARS)
        .with_extensions(&[".txt", ".py"], &[".pycon"])
}
