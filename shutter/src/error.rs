use std::time::Duration;

use thiserror::Error;

/// Why an identity was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Unknown user or wrong password.
    Invalid,
    /// Known user whose account is blocked.
    Blocked,
    /// A protected call was made without any identity.
    Unauthenticated,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::Invalid => write!(f, "INVALID"),
            AuthFailure::Blocked => write!(f, "BLOCKED"),
            AuthFailure::Unauthenticated => write!(f, "UNAUTHENTICATED"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShutterError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("request superseded")]
    Cancelled,

    #[error("auth error: {0}")]
    Auth(AuthFailure),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ShutterError {
    /// Whether the failure is transient and worth retrying automatically.
    ///
    /// Validation, auth and cancellation are final. Client-side HTTP errors
    /// are final too, except 429 which the provider uses for rate limiting.
    pub fn is_retryable(&self) -> bool {
        match self {
            ShutterError::Upstream(_)
            | ShutterError::Request(_)
            | ShutterError::Json(_)
            | ShutterError::Io(_)
            | ShutterError::Timeout(_) => true,
            ShutterError::Http { status, .. } => *status >= 500 || *status == 429,
            ShutterError::Validation(_) | ShutterError::Cancelled | ShutterError::Auth(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShutterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ShutterError::Upstream("boom".into()).is_retryable());
        assert!(ShutterError::Timeout(Duration::from_secs(15)).is_retryable());
        assert!(ShutterError::Http {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(ShutterError::Http {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!ShutterError::Http {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!ShutterError::Validation("page".into()).is_retryable());
        assert!(!ShutterError::Cancelled.is_retryable());
        assert!(!ShutterError::Auth(AuthFailure::Blocked).is_retryable());
    }

    #[test]
    fn test_auth_failure_display() {
        assert_eq!(AuthFailure::Invalid.to_string(), "INVALID");
        assert_eq!(
            ShutterError::Auth(AuthFailure::Blocked).to_string(),
            "auth error: BLOCKED"
        );
    }
}
