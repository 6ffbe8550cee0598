//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use crate::provider::ProviderId;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    /// No provider carries a usable secret.
    #[error("no API key configured; set one of: {fields}")]
    NoCredentials { fields: String },
}

impl ConfigError {
    /// The no-credential failure, listing every recognised credential field.
    pub fn no_credentials() -> Self {
        ConfigError::NoCredentials { fields: ProviderId::credential_fields() }
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `temperature` is outside 0.0..=2.0
    /// - `max_tokens` is 0
    /// - `request_timeout_ms` is outside 1s..=10min
    /// - `navigation_timeout_ms` or `wait_timeout_ms` is outside 100ms..=5min
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature".into(),
                reason: "must be between 0.0 and 2.0".into(),
            });
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid { field: "max_tokens".into(), reason: "must be greater than 0".into() });
        }

        if self.request_timeout_ms < 1_000 || self.request_timeout_ms > 600_000 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms".into(),
                reason: "must be between 1000ms and 600000ms".into(),
            });
        }

        for (field, value) in [
            ("navigation_timeout_ms", self.navigation_timeout_ms),
            ("wait_timeout_ms", self.wait_timeout_ms),
        ] {
            if value < 100 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
            }
            if value > 300_000 {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if let Some(model) = &self.model_name
            && model.trim().is_empty()
        {
            tracing::warn!("model_name is set but blank; provider defaults will be used");
        }

        Ok(())
    }
}
