//! Interpreter variants.
//!
//! A [`Variant`] captures everything that differs between interpreters:
//! command line, prompt set, trim pattern, line ending, splitting strategy
//! and the optional variable-dump template. The session driver is not
//! specialized per interpreter; it takes a `Variant` value.

pub mod interpreters;
mod registry;
mod splitter;

pub use registry::VariantRegistry;
pub use splitter::LineSplitter;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::channel::SearchTerms;
use crate::error::{ConfigError, Result};

/// Placeholder in dump templates replaced by the artifact path.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Per-interpreter configuration.
///
/// Serializable so variants can be loaded from JSON as well as defined in
/// code. Missing fields take the defaults of [`Variant::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variant {
    /// Variant name (e.g., "python", "r").
    pub name: String,

    /// Alternative names for registry lookups.
    pub aliases: Vec<String>,

    /// Default command line for the interpreter.
    pub command: String,

    /// Prompts signalling the interpreter wants more input.
    pub prompts: Vec<String>,

    /// Regex for prompt-echo lines trimmed off the end of a transcript.
    pub trim_prompt: String,

    /// Line ending the child's terminal emits.
    pub line_ending: String,

    /// Appended to every submission unit sent to the child.
    pub newline: String,

    /// Whether a prompt may match without a preceding line ending.
    pub allow_bare_prompt: bool,

    /// How input blocks are split into submission units.
    pub splitter: LineSplitter,

    /// Code that writes all variable bindings as JSON to `{path}`.
    pub dump_template: Option<String>,

    /// Input file extensions this variant accepts.
    pub input_extensions: Vec<String>,

    /// Output file extensions this variant produces.
    pub output_extensions: Vec<String>,
}

impl Variant {
    /// Create a variant with Python-style prompt defaults.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: vec![],
            command: command.into(),
            prompts: vec![">>>".to_string(), "...".to_string()],
            trim_prompt: ">>>".to_string(),
            line_ending: "\r\n".to_string(),
            newline: "\n".to_string(),
            allow_bare_prompt: false,
            splitter: LineSplitter::Default,
            dump_template: None,
            input_extensions: vec![".txt".to_string()],
            output_extensions: vec![".txt".to_string()],
        }
    }

    /// Parse a variant definition from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let variant: Variant = serde_json::from_str(json).map_err(ConfigError::from)?;
        variant.validate()?;
        Ok(variant)
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Replace the prompt set.
    pub fn with_prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompts = prompts.into_iter().map(Into::into).collect();
        self
    }

    /// Use a single fixed prompt.
    pub fn with_prompt(self, prompt: impl Into<String>) -> Self {
        self.with_prompts([prompt.into()])
    }

    /// Set the trim pattern.
    pub fn with_trim_prompt(mut self, pattern: impl Into<String>) -> Self {
        self.trim_prompt = pattern.into();
        self
    }

    /// Set the output line ending.
    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    /// Allow prompts to match without a preceding line ending.
    pub fn with_bare_prompt(mut self, allow: bool) -> Self {
        self.allow_bare_prompt = allow;
        self
    }

    /// Set the splitting strategy.
    pub fn with_splitter(mut self, splitter: LineSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Set the variable-dump template. `{path}` marks the artifact path.
    pub fn with_dump_template(mut self, template: impl Into<String>) -> Self {
        self.dump_template = Some(template.into());
        self
    }

    /// Set input and output file extensions.
    pub fn with_extensions(mut self, input: &[&str], output: &[&str]) -> Self {
        self.input_extensions = input.iter().map(|s| s.to_string()).collect();
        self.output_extensions = output.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Whether `name` is this variant's name or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Search terms for this variant's prompts.
    pub fn search_terms(&self) -> SearchTerms {
        SearchTerms::build(&self.prompts, &self.line_ending, self.allow_bare_prompt)
    }

    /// Compile the trim pattern into a whole-line matcher.
    pub fn trim_regex(&self) -> Result<Regex> {
        let pattern = format!(r"^\s*(?:{})\s*$", self.trim_prompt);
        Regex::new(&pattern).map_err(|e| ConfigError::from(e).into())
    }

    /// Check the definition is usable for a session.
    pub fn validate(&self) -> Result<()> {
        let invalid =
            |message: String| -> crate::Error { ConfigError::InvalidConfig { message }.into() };

        if self.name.is_empty() {
            return Err(invalid("variant name is empty".to_string()));
        }
        if self.prompts.is_empty() || self.prompts.iter().any(String::is_empty) {
            return Err(invalid(format!(
                "variant '{}' needs at least one non-empty prompt",
                self.name
            )));
        }
        if self.line_ending.is_empty() {
            return Err(invalid(format!(
                "variant '{}' has an empty line ending",
                self.name
            )));
        }
        if let Some(ref template) = self.dump_template {
            if !template.contains(PATH_PLACEHOLDER) {
                return Err(invalid(format!(
                    "dump template of variant '{}' has no {} placeholder",
                    self.name, PATH_PLACEHOLDER
                )));
            }
        }
        self.trim_regex()?;
        Ok(())
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::new("", "")
    }
}
