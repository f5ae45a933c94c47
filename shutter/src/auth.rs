//! Credential check against a static user table.

use crate::config::{AccountStatus, AuthConfig};
use crate::error::{AuthFailure, Result, ShutterError};

/// An authenticated, allowed user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Check credentials.
    ///
    /// Empty or unknown credentials are [`AuthFailure::Invalid`]; a matching
    /// blocked account is [`AuthFailure::Blocked`].
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        if username.is_empty() || password.is_empty() {
            return Err(ShutterError::Auth(AuthFailure::Invalid));
        }
        let user = self
            .config
            .users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .ok_or(ShutterError::Auth(AuthFailure::Invalid))?;

        match user.status {
            AccountStatus::Blocked => {
                tracing::warn!(username, "blocked account refused");
                Err(ShutterError::Auth(AuthFailure::Blocked))
            }
            AccountStatus::Active => Ok(Identity {
                username: user.username.clone(),
            }),
        }
    }
}
