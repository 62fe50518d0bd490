use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Engine settings, usually loaded from a TOML file. Every field has a
/// default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Deepest allowed nesting of compound conditions.
    #[serde(default = "default_max_condition_depth")]
    pub max_condition_depth: usize,

    /// Source label recorded with every write the executor performs.
    #[serde(default = "default_enrichment_source")]
    pub enrichment_source: String,

    /// Whether a batch pass logs and skips a failing rule instead of
    /// aborting.
    #[serde(default = "default_skip_failed_rules")]
    pub skip_failed_rules: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_condition_depth: default_max_condition_depth(),
            enrichment_source: default_enrichment_source(),
            skip_failed_rules: default_skip_failed_rules(),
        }
    }
}

fn default_max_condition_depth() -> usize {
    8
}

fn default_enrichment_source() -> String {
    "rule".to_owned()
}

fn default_skip_failed_rules() -> bool {
    true
}

impl EngineConfig {
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`EngineConfig::parse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.max_condition_depth == 0 {
            return Err(ConfigError::Invalid {
                message: "max_condition_depth must be at least 1".to_owned(),
            });
        }
        if self.enrichment_source.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "enrichment_source must not be blank".to_owned(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {message}")]
    Parse { message: String },

    #[error("invalid config: {message}")]
    Invalid { message: String },
}
