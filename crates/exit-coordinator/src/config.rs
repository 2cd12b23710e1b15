//! # Coordinator Configuration
//!
//! [`CoordinatorConfig`] is plain serde data, so it can be embedded in any
//! application config file. Environment variables override file values:
//!
//! - `EXIT_COORDINATOR_NAME` - name used in log spans
//! - `EXIT_TIMEOUT_MS` - default per-phase timeout, `0` waits forever

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const NAME_ENV: &str = "EXIT_COORDINATOR_NAME";
pub const TIMEOUT_ENV: &str = "EXIT_TIMEOUT_MS";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a whole number of milliseconds, got {value:?}")]
    InvalidTimeout { key: &'static str, value: String },
}

/// Settings for building a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub name: String,
    pub timeout_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            name: "exit".to_string(),
            timeout_ms: 0,
        }
    }
}

impl CoordinatorConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(name) = lookup(NAME_ENV).filter(|name| !name.is_empty()) {
            self.name = name;
        }
        if let Some(value) = lookup(TIMEOUT_ENV) {
            self.timeout_ms = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout {
                    key: TIMEOUT_ENV,
                    value,
                })?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}
