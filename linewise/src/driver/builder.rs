//! Builder for session configuration.

use std::path::PathBuf;
use std::time::Duration;

use super::SessionDriver;
use super::output::ExitPolicy;
use crate::error::{ConfigError, Result};
use crate::transport::SpawnConfig;
use crate::variant::{Variant, VariantRegistry};

/// Everything one session needs. Immutable once built.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The interpreter variant.
    pub variant: Variant,

    /// How to launch the interpreter.
    pub spawn: SpawnConfig,

    /// Timeout for each expectation match.
    pub timeout: Duration,

    /// How long to wait for the interpreter to exit once input is closed.
    pub close_timeout: Duration,

    /// Handling of non-zero exit statuses.
    pub exit_policy: ExitPolicy,

    /// Where the interpreter should dump its variables, if at all.
    pub vars_artifact: Option<PathBuf>,
}

/// Builder for constructing session configurations and drivers.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use linewise::SessionBuilder;
///
/// # fn example() -> Result<(), linewise::Error> {
/// let driver = SessionBuilder::new("python")
///     .command("python3")
///     .env("PYTHONHASHSEED", "0")
///     .timeout(Duration::from_secs(10))
///     .lenient()
///     .build_driver()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    variant_name: Option<String>,
    custom_variant: Option<Variant>,
    command: Option<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    timeout: Duration,
    close_timeout: Duration,
    exit_policy: ExitPolicy,
    vars_artifact: Option<PathBuf>,
    terminal_width: u16,
    terminal_height: u16,
}

impl SessionBuilder {
    /// Create a builder for a registered variant (name or alias).
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant_name: Some(variant.into()),
            ..Self::empty()
        }
    }

    /// Create a builder for a variant defined by the caller.
    pub fn with_variant(variant: Variant) -> Self {
        Self {
            custom_variant: Some(variant),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            variant_name: None,
            custom_variant: None,
            command: None,
            cwd: None,
            env: Vec::new(),
            timeout: Duration::from_secs(30),
            close_timeout: Duration::from_secs(10),
            exit_policy: ExitPolicy::Strict,
            vars_artifact: None,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Override the variant's command line.
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the working directory of the interpreter.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add an environment override.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the per-expectation timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long closing may take before the process is killed.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Set the exit policy.
    pub fn exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.exit_policy = policy;
        self
    }

    /// Report non-zero exit statuses as warnings instead of errors.
    pub fn lenient(self) -> Self {
        self.exit_policy(ExitPolicy::Lenient)
    }

    /// Have the interpreter dump its variables to `path` after the last block.
    pub fn record_vars(mut self, path: impl Into<PathBuf>) -> Self {
        self.vars_artifact = Some(path.into());
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Build the session configuration.
    pub fn build(self) -> Result<SessionConfig> {
        let variant = match (self.custom_variant, self.variant_name) {
            (Some(custom), _) => custom,
            (None, Some(name)) => VariantRegistry::resolve(&name)?,
            (None, None) => {
                return Err(ConfigError::InvalidConfig {
                    message: "variant must be specified".to_string(),
                }
                .into());
            }
        };
        variant.validate()?;

        if self.vars_artifact.is_some() && variant.dump_template.is_none() {
            return Err(ConfigError::MissingDumpTemplate {
                variant: variant.name.clone(),
            }
            .into());
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        let mut spawn = SpawnConfig::new(self.command.unwrap_or_else(|| variant.command.clone()));
        spawn.cwd = self.cwd;
        spawn.env.extend(self.env);
        spawn.terminal_width = self.terminal_width;
        spawn.terminal_height = self.terminal_height;
        spawn.argv()?;

        Ok(SessionConfig {
            variant,
            spawn,
            timeout: self.timeout,
            close_timeout: self.close_timeout,
            exit_policy: self.exit_policy,
            vars_artifact: self.vars_artifact,
        })
    }

    /// Build a driver for the configuration.
    pub fn build_driver(self) -> Result<SessionDriver> {
        Ok(SessionDriver::new(self.build()?))
    }
}
