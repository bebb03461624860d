//! R interactive console.
//!
//! R prompts with `>` and continues with `+`, and frequently redraws the
//! prompt without a fresh line, so bare prompt matches are allowed.

use crate::variant::Variant;

/// Writes the global environment as JSON when rjson is available.
const DUMP_VARS: &str = r#"if ("rjson" %in% installed.packages()) {
    library(rjson)
    linewise__json_file <- file("{path}", "w")
    writeLines(toJSON(as.list(environment())), linewise__json_file)
    close(linewise__json_file)
} else {
   cat("Can't automatically save environment to JSON since rjson package not installed.")
}
"#;

/// Create the R variant.
pub fn variant() -> Variant {
    Variant::new("r", "R --quiet --vanilla")
        .with_alias("rint")
        .with_prompts([">", "+"])
        .with_trim_prompt(">")
        .with_bare_prompt(true)
        .with_dump_template(DUMP_VARS)
        .with_extensions(&[".txt", ".r", ".R"], &[".Rout"])
}
