// src/config/mod.rs
// Settings resolution: CLI flag > environment > config file > defaults

mod file;

pub use file::{FileConfig, config_dir, config_path};

use std::time::Duration;
use tracing::debug;

use crate::llm::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// Fallback env var for the API key (GEMINI_API_KEY is read by clap)
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Resolved runtime settings (never includes the API key)
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub api_base: String,
    pub request_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
        }
    }
}

impl Settings {
    /// Merge CLI/env values (already combined by clap) over the config file
    pub fn resolve(model: Option<String>, api_base: Option<String>, file: FileConfig) -> Self {
        let defaults = Self::default();
        let settings = Self {
            model: non_blank(model)
                .or_else(|| non_blank(file.model))
                .unwrap_or(defaults.model),
            api_base: non_blank(api_base)
                .or_else(|| non_blank(file.api_base))
                .unwrap_or(defaults.api_base),
            request_timeout: file
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };
        debug!(
            model = %settings.model,
            api_base = %settings.api_base,
            timeout = ?settings.request_timeout,
            "Resolved settings"
        );
        settings
    }
}

/// Pick the API key from the CLI/GEMINI_API_KEY value or GOOGLE_API_KEY.
/// Blank values count as absent.
pub fn resolve_api_key(cli_or_env: Option<String>) -> Option<String> {
    non_blank(cli_or_env).or_else(|| non_blank(std::env::var(GOOGLE_API_KEY_ENV).ok()))
}

/// Load `.env` from ~/.csl-metrix/.env, else from the current directory
pub fn load_dotenv() {
    let env_path = config_dir().join(".env");
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    } else {
        let _ = dotenvy::dotenv();
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
