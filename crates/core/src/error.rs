//! Unified error types for sitex.
//!
//! Each variant renders with a stable upper-case code prefix so that
//! diagnostics stay greppable across releases.

use crate::config::ConfigError;

/// Unified error type for the sitex crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable credential, or configuration failed to load or validate.
    #[error("CONFIG_ERROR: {0}")]
    Configuration(String),

    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Language-model call failed (transport, auth, rate limit).
    #[error("BACKEND_ERROR: {0}")]
    Backend(String),

    /// Browser navigation or content retrieval failed.
    #[error("FETCH_ERROR: {0}")]
    Fetch(String),

    /// Navigation or selector wait exceeded its budget.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Backend(_) => "BACKEND_ERROR",
            Error::Fetch(_) => "FETCH_ERROR",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
        }
    }

    /// Whether the failure is local to one item and may succeed on retry.
    ///
    /// Configuration failures invalidate the whole session and are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Backend(_) | Error::Fetch(_) | Error::FetchTimeout(_))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FetchTimeout("navigation after 30000ms".to_string());
        assert!(err.to_string().starts_with("FETCH_TIMEOUT"));
        assert!(err.to_string().contains("30000ms"));
    }

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Backend("x".into()).code(), "BACKEND_ERROR");
        assert_eq!(Error::InvalidUrl("x".into()).code(), "INVALID_URL");
    }

    #[test]
    fn test_from_config_error() {
        let err: Error = ConfigError::Invalid { field: "temperature".into(), reason: "out of range".into() }.into();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("temperature"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Backend("timeout".into()).is_retryable());
        assert!(Error::FetchTimeout("navigation".into()).is_retryable());
        assert!(!Error::InvalidUrl("ftp://x".into()).is_retryable());
    }
}
