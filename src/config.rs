use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::pr::client::DEFAULT_API_URL;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".merged-pr.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("GitHub token not found: set the github_token input, GITHUB_TOKEN, or [github].token")]
    MissingToken,
}

/// Top-level configuration loaded from .merged-pr.toml.
/// All fields are optional — the tool works with zero config inside a runner.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// REST API base URL. If None, falls back to GITHUB_API_URL, then api.github.com.
    pub api_url: Option<String>,
}

impl Config {
    /// Load configuration from `path`, or from .merged-pr.toml in the current
    /// directory. A missing default file yields the default config; a missing
    /// explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: an explicit value (CLI flag or action input)
    /// wins, then the config file, then the GITHUB_TOKEN env var.
    pub fn github_token(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        non_empty(explicit.map(str::to_string))
            .or_else(|| non_empty(self.github.token.clone()))
            .or_else(|| non_empty(std::env::var("GITHUB_TOKEN").ok()))
            .ok_or(ConfigError::MissingToken)
    }

    /// Resolve the REST API base URL with the same precedence as the token.
    pub fn api_url(&self, explicit: Option<&str>) -> String {
        non_empty(explicit.map(str::to_string))
            .or_else(|| non_empty(self.github.api_url.clone()))
            .or_else(|| non_empty(std::env::var("GITHUB_API_URL").ok()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
