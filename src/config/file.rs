// src/config/file.rs
// File-based configuration from ~/.csl-metrix/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Contents of the config file. The API key is deliberately not a field.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Model identifier, e.g. `gemini-pro` or `models/gemini-1.5-flash`
    pub model: Option<String>,
    /// Base URL of the Gemini REST API
    pub api_base: Option<String>,
    /// Optional request timeout; none by default
    pub request_timeout_secs: Option<u64>,
    /// Present only to detect and refuse a stored key
    #[serde(default)]
    api_key: Option<toml::Value>,
}

impl FileConfig {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config from file");
                config
            }
            Err(e) => {
                warn!(error = %e, "Ignoring config file");
                Self::default()
            }
        }
    }

    /// Load and parse a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        if config.api_key.take().is_some() {
            warn!(
                path = %path.display(),
                "api_key in config file is ignored; pass --api-key or set GEMINI_API_KEY"
            );
        }
        Ok(config)
    }
}

/// Directory holding config.toml and .env
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".csl-metrix")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}
