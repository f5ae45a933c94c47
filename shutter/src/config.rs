use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Result, ShutterError};

/// Public Unsplash API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.unsplash.com";

/// Environment variable holding the provider access key.
pub const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";

/// Configuration for the upstream gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the photo provider (e.g. `https://api.unsplash.com`).
    pub base_url: String,
    /// Provider access key, sent as `Client-ID`.
    pub access_key: String,
    /// Maximum age of a cached page before it is considered stale.
    pub cache_ttl: Duration,
    /// Per-request timeout for upstream calls.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_key: String::new(),
            cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl GatewayConfig {
    /// Build a config with the access key taken from the environment.
    ///
    /// A missing key is not fatal; the provider will reject requests and the
    /// failure surfaces as an upstream error.
    pub fn from_env() -> Self {
        let access_key = std::env::var(ACCESS_KEY_ENV).unwrap_or_else(|_| {
            tracing::warn!("{ACCESS_KEY_ENV} is not set, upstream calls will fail");
            String::new()
        });
        Self {
            access_key,
            ..Default::default()
        }
    }

    /// Check that `base_url` parses as an absolute URL.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map(|_| ())
            .map_err(|e| ShutterError::Validation(format!("invalid base url {}: {e}", self.base_url)))
    }
}

/// Account status in the static user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Blocked,
}

/// A single entry of the static user table.
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
    pub status: AccountStatus,
}

/// Credentials accepted by the [`crate::auth::Authenticator`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub users: Vec<UserEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let entry = |username: &str, password: &str, status| UserEntry {
            username: username.to_string(),
            password: password.to_string(),
            status,
        };
        Self {
            users: vec![
                entry("muser1", "mpassword1", AccountStatus::Active),
                entry("muser2", "mpassword2", AccountStatus::Active),
                entry("muser3", "mpassword3", AccountStatus::Blocked),
            ],
        }
    }
}

/// Location of the liked-items file.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".db").join("likes.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let cfg = GatewayConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ShutterError::Validation(_))));
    }

    #[test]
    fn test_default_user_table() {
        let cfg = AuthConfig::default();
        assert_eq!(cfg.users.len(), 3);
        assert_eq!(cfg.users[2].status, AccountStatus::Blocked);
    }
}
