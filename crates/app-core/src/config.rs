//! Registration flow configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::validation::MIN_PASSWORD_LENGTH;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration is not valid JSON for this structure
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings of the registration form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationConfig {
    /// Minimum password length (never below [`MIN_PASSWORD_LENGTH`])
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Delay before an availability query is sent, in milliseconds
    ///
    /// A query superseded during the delay is never sent.
    #[serde(default)]
    pub availability_debounce_ms: u64,

    /// Trim surrounding whitespace from name and surname
    #[serde(default = "default_true")]
    pub trim_personal_names: bool,
}

fn default_min_password_length() -> usize {
    MIN_PASSWORD_LENGTH
}

fn default_true() -> bool {
    true
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            min_password_length: MIN_PASSWORD_LENGTH,
            availability_debounce_ms: 0,
            trim_personal_names: true,
        }
    }
}

impl RegistrationConfig {
    /// Parse and validate a JSON configuration
    ///
    /// Missing keys take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable
    pub fn validate(&self) -> Result<()> {
        if self.min_password_length < MIN_PASSWORD_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "minPasswordLength must be at least {}, got {}",
                MIN_PASSWORD_LENGTH, self.min_password_length
            )));
        }
        Ok(())
    }

    /// Availability debounce as a duration
    pub fn availability_debounce(&self) -> Duration {
        Duration::from_millis(self.availability_debounce_ms)
    }
}
