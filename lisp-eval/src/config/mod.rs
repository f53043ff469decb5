//! Runtime configuration
//!
//! `RuntimeConfig` is read from TOML, either from a string or from a file:
//!
//! ```toml
//! max_call_depth = 500
//! source_name = "init.lisp"
//! ```

pub mod types;

pub use types::RuntimeConfig;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl RuntimeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded runtime config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_call_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.source_name.is_empty() {
            return Err(ConfigError::Invalid {
                field: "source_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
