use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{CleanerError, Result};
use crate::pipeline::PipelineOptions;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "SHEET_CLEANER_ACCESS_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineOptions,
    #[serde(default)]
    pub source: SourceConfig,
    pub demo: Option<DemoConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Name of the environment variable holding a bearer token for private sheets.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_access_token_env() -> String {
    DEFAULT_ACCESS_TOKEN_ENV.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            access_token_env: default_access_token_env(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Bearer token from the configured environment variable, if set and non-empty.
    pub fn access_token(&self) -> Option<String> {
        std::env::var(&self.access_token_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Sheet used when the caller asks for demo mode instead of supplying their own.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    pub sheet_url: String,
    pub sheet_name: String,
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at '{}', using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.source.timeout_seconds == 0 {
            return Err(CleanerError::Config(
                "source.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
