//! Runtime configuration.
//!
//! Built in code through [`RuntimeConfig::builder`] or read from the
//! environment:
//!
//! | Variable             | Values                                   |
//! |----------------------|------------------------------------------|
//! | `TAL_MAX_CALL_DEPTH` | positive integer, or `unlimited`         |
//! | `TAL_CAPABILITIES`   | comma list (`string,regex`), `all`, `none` |
//! | `TAL_OUTPUT`         | `capture`, `stdout`, `silent`            |

use tal_eval::{Capability, DEFAULT_MAX_CALL_DEPTH};
use thiserror::Error;

pub const MAX_CALL_DEPTH_VAR: &str = "TAL_MAX_CALL_DEPTH";
pub const CAPABILITIES_VAR: &str = "TAL_CAPABILITIES";
pub const OUTPUT_VAR: &str = "TAL_OUTPUT";

/// Invalid configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid TAL_MAX_CALL_DEPTH `{value}`: expected a positive integer or `unlimited`")]
    InvalidCallDepth { value: String },
    #[error("unknown capability `{name}` in TAL_CAPABILITIES")]
    UnknownCapability { name: String },
    #[error("invalid TAL_OUTPUT `{value}`: expected `capture`, `stdout` or `silent`")]
    InvalidOutput { value: String },
}

/// Where `print` output goes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Collected and returned with the execution.
    #[default]
    Capture,
    Stdout,
    Silent,
}

impl OutputMode {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "capture" => Ok(OutputMode::Capture),
            "stdout" => Ok(OutputMode::Stdout),
            "silent" => Ok(OutputMode::Silent),
            _ => Err(ConfigError::InvalidOutput {
                value: value.to_string(),
            }),
        }
    }
}

/// Settings for a [`Runtime`](crate::Runtime).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Call-depth limit; `None` disables the check.
    pub max_call_depth: Option<usize>,
    /// Capabilities granted to programs.
    pub capabilities: Capability,
    pub output: OutputMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_call_depth: Some(DEFAULT_MAX_CALL_DEPTH),
            capabilities: Capability::all(),
            output: OutputMode::Capture,
        }
    }
}

impl RuntimeConfig {
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Defaults overridden by the `TAL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = RuntimeConfig::default();
        if let Some(value) = lookup(MAX_CALL_DEPTH_VAR) {
            config.max_call_depth = parse_call_depth(&value)?;
        }
        if let Some(value) = lookup(CAPABILITIES_VAR) {
            config.capabilities = Capability::parse_list(&value)
                .map_err(|name| ConfigError::UnknownCapability { name })?;
        }
        if let Some(value) = lookup(OUTPUT_VAR) {
            config.output = OutputMode::parse(&value)?;
        }
        tracing::debug!(
            max_call_depth = ?config.max_call_depth,
            capabilities = %config.capabilities.describe(),
            output = ?config.output,
            "runtime configuration"
        );
        Ok(config)
    }
}

fn parse_call_depth(value: &str) -> Result<Option<usize>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("unlimited") {
        return Ok(None);
    }
    match trimmed.parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(Some(depth)),
        _ => Err(ConfigError::InvalidCallDepth {
            value: value.to_string(),
        }),
    }
}

/// Builder for [`RuntimeConfig`].
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    #[must_use]
    pub fn max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.config.max_call_depth = depth;
        self
    }

    /// Replace the granted capability set.
    #[must_use]
    pub fn capabilities(mut self, capabilities: Capability) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn grant(mut self, capabilities: Capability) -> Self {
        self.config.capabilities |= capabilities;
        self
    }

    #[must_use]
    pub fn revoke(mut self, capabilities: Capability) -> Self {
        self.config.capabilities -= capabilities;
        self
    }

    #[must_use]
    pub fn output(mut self, output: OutputMode) -> Self {
        self.config.output = output;
        self
    }

    pub fn build(self) -> RuntimeConfig {
        self.config
    }
}
