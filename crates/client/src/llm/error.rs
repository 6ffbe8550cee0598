//! Language-model backend error types.

use std::sync::Arc;

use reqwest::StatusCode;

/// Errors from a language-model backend call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// Authentication failed (invalid or revoked API key).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Non-success HTTP status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// The provider answered with a body we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Upper bound on how much of an error body is kept in the message.
const MAX_ERROR_BODY: usize = 512;

impl BackendError {
    /// Map a non-success status and its body to an error.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = crate::extract::truncate_chars(body.trim(), MAX_ERROR_BODY).to_string();
        match status.as_u16() {
            401 | 403 => BackendError::Auth(format!("status {}", status.as_u16())),
            429 => BackendError::RateLimited,
            code => BackendError::Http { status: code, body },
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout | BackendError::Network(_) | BackendError::RateLimited => true,
            BackendError::Http { status, .. } => *status >= 500,
            BackendError::Auth(_) | BackendError::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    /// Request URLs are stripped: some providers authenticate through them.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { BackendError::Timeout } else { BackendError::Network(Arc::new(err.without_url())) }
    }
}

impl From<BackendError> for sitex_core::Error {
    fn from(err: BackendError) -> Self {
        sitex_core::Error::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_auth() {
        let err = BackendError::from_status(StatusCode::UNAUTHORIZED, "bad key");
        assert!(matches!(err, BackendError::Auth(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_from_status_rate_limited() {
        let err = BackendError::from_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, BackendError::RateLimited));
        assert!(err.is_transient());
    }

    #[test]
    fn test_from_status_server_error_truncates_body() {
        let body = "x".repeat(2_000);
        let err = BackendError::from_status(StatusCode::BAD_GATEWAY, &body);
        match &err {
            BackendError::Http { status, body } => {
                assert_eq!(*status, 502);
                assert_eq!(body.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_error_not_transient() {
        let err = BackendError::from_status(StatusCode::BAD_REQUEST, "{\"error\":\"bad model\"}");
        assert!(!err.is_transient());
        assert!(err.to_string().contains("bad model"));
    }

    #[test]
    fn test_into_core_error() {
        let err: sitex_core::Error = BackendError::Timeout.into();
        assert!(err.to_string().starts_with("BACKEND_ERROR"));
    }
}
