//! Domain service for administrator authentication.
//!
//! Checks a username/password pair against the credential store and, on success,
//! mints a session token.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::constants::auth::INVALID_CREDENTIALS_MESSAGE;
use crate::services::token::Identity;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user, wrong password and disabled account all land here.
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{err:#}"))
    }
}

/// Account details safe to hand to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct AdminInfo {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials, records the login and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for any credential failure, whatever the cause.
    async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, AuthError>;

    /// Loads the account behind an already-verified identity.
    async fn admin_info(&self, id: i32) -> Result<Option<AdminInfo>, AuthError>;
}
