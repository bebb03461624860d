//! Variable-dump injection.
//!
//! When variable recording is requested, one synthetic block is appended to
//! the input. It runs through the session like any other block, and the
//! interpreter writes its bindings straight to the artifact file; the block's
//! own transcript is thrown away.

use std::path::Path;

use log::debug;

use super::InputBlocks;
use crate::error::{ConfigError, Result};
use crate::variant::{PATH_PLACEHOLDER, Variant};

/// Reserved block key for the injected dump code.
pub const SAVE_VARS_KEY: &str = "linewise--save-vars";

/// Artifact file name for the variables of the document keyed `doc_key`.
pub fn vars_artifact_name(doc_key: &str) -> String {
    format!("{doc_key}-vars.json")
}

/// Append the variant's dump code, targeting `artifact`, to `blocks`.
pub fn inject_variable_dump(
    blocks: &InputBlocks,
    variant: &Variant,
    artifact: &Path,
) -> Result<InputBlocks> {
    let template = variant.dump_template.as_deref().ok_or_else(|| {
        ConfigError::MissingDumpTemplate {
            variant: variant.name.clone(),
        }
    })?;

    if blocks.contains_key(SAVE_VARS_KEY) {
        return Err(ConfigError::InvalidConfig {
            message: format!("input already uses the reserved block key '{SAVE_VARS_KEY}'"),
        }
        .into());
    }

    let code = template.replace(PATH_PLACEHOLDER, &artifact.to_string_lossy());
    debug!("injecting {} dump into {}", variant.name, artifact.display());

    let mut injected = blocks.clone();
    injected.insert(SAVE_VARS_KEY.to_string(), code);
    Ok(injected)
}
