// Client configuration: API endpoint, request timeout and verification
// policy. Layered as defaults < ~/.datafiles/config.json < environment.

use crate::error::{CliError, Result};
use crate::verify::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_URL_ENV: &str = "DATAFILES_API_URL";
pub const TIMEOUT_ENV: &str = "DATAFILES_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub timeout_secs: u64,
    pub verify_attempts: u32,
    pub verify_base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: "http://localhost:3001".into(),
            timeout_secs: 60,
            verify_attempts: RetryPolicy::MAX_ATTEMPTS,
            verify_base_delay_ms: RetryPolicy::BASE_DELAY_MS,
        }
    }
}

impl Config {
    /// Load the config file if it exists, then apply environment overrides.
    pub fn load() -> Result<Config> {
        let mut config = match get_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply overrides from a variable lookup. Taking the lookup as a closure
    /// keeps tests away from the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = raw
                .parse()
                .map_err(|_| CliError::Config(format!("{TIMEOUT_ENV} must be a number, got {raw:?}")))?;
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        if self.verify_attempts == 0 {
            return Err(CliError::Config("verify_attempts must be at least 1".into()));
        }
        Ok(RetryPolicy {
            max_attempts: self.verify_attempts,
            base_delay: Duration::from_millis(self.verify_base_delay_ms),
        })
    }
}

/// Location of the optional config file, `None` without a home directory.
pub fn get_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".datafiles").join("config.json"))
}
