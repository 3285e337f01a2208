//! Login page behaviour, independent of any UI toolkit.
//!
//! The attempt counter here is advisory: it spares the server obviously doomed requests,
//! but the server enforces its own lockout regardless.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::login_flow::{
    ALREADY_AUTHENTICATED_DELAY, BLOCK_MINUTES, MAX_ATTEMPTS, SUCCESS_DELAY,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Auth server unreachable: {0}")]
    Transport(String),

    #[error("Unexpected response from auth server: HTTP {0}")]
    UnexpectedStatus(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusUser {
    pub username: String,
    pub role: String,
}

/// Body of `GET /api/auth/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<StatusUser>,
}

/// What the server said about a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginReply {
    Accepted,
    Rejected { message: String },
    /// The server-side lockout is active for this client.
    Throttled,
}

#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    async fn status(&self) -> Result<AuthStatus, ClientError>;

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply, ClientError>;
}

/// Where to go next, and how long to show the success message first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: String,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    InvalidInput,
    Blocked { minutes_left: i64 },
    Success(Navigation),
    Rejected { remaining_attempts: u32 },
    LockedOut,
    Unavailable,
}

impl LoginOutcome {
    /// Text the login page shows for this outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput => "Please enter both username and password".to_string(),
            Self::Blocked { minutes_left } => format!(
                "Too many failed attempts. Try again in {minutes_left} minute(s)."
            ),
            Self::Success(_) => "Login successful. Redirecting...".to_string(),
            Self::Rejected { remaining_attempts } => format!(
                "Invalid username or password. {remaining_attempts} attempt(s) left."
            ),
            Self::LockedOut => format!(
                "Too many failed attempts. Login is blocked for {BLOCK_MINUTES} minutes."
            ),
            Self::Unavailable => "Server is unavailable. Please try again later.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginAttemptCounter {
    attempt_count: u32,
    blocked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptCounter {
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    #[must_use]
    pub const fn blocked_until(&self) -> Option<DateTime<Utc>> {
        self.blocked_until
    }

    /// Whole minutes (rounded up) until the block lifts. An elapsed block is cleared
    /// together with the attempt count.
    pub fn minutes_left(&mut self, now: DateTime<Utc>) -> Option<i64> {
        let until = self.blocked_until?;
        if now >= until {
            self.reset();
            return None;
        }

        let seconds = (until - now).num_seconds();
        Some(((seconds + 59) / 60).max(1))
    }

    /// Counts a rejection. Returns the attempts still allowed, or `None` once blocked.
    pub fn record_rejection(&mut self, now: DateTime<Utc>) -> Option<u32> {
        self.attempt_count += 1;
        if self.attempt_count >= MAX_ATTEMPTS {
            self.block(now);
            return None;
        }
        Some(MAX_ATTEMPTS - self.attempt_count)
    }

    pub fn block(&mut self, now: DateTime<Utc>) {
        self.attempt_count = self.attempt_count.max(MAX_ATTEMPTS);
        self.blocked_until = Some(now + chrono::Duration::minutes(BLOCK_MINUTES));
    }

    pub const fn reset(&mut self) {
        self.attempt_count = 0;
        self.blocked_until = None;
    }
}

/// Accepts only local absolute paths; anything else falls back to `default`.
#[must_use]
pub fn sanitize_redirect(raw: Option<&str>, default: &str) -> String {
    match raw.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => default.to_string(),
    }
}

pub struct LoginFlow<A> {
    api: A,
    counter: LoginAttemptCounter,
    return_to: String,
    authenticated: bool,
}

impl<A: AuthApi> LoginFlow<A> {
    /// `redirect` is the raw `redirect` query parameter of the login page.
    pub fn new(api: A, redirect: Option<&str>, landing_path: &str) -> Self {
        Self {
            api,
            counter: LoginAttemptCounter::default(),
            return_to: sanitize_redirect(redirect, landing_path),
            authenticated: false,
        }
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn return_to(&self) -> &str {
        &self.return_to
    }

    #[must_use]
    pub const fn counter(&self) -> &LoginAttemptCounter {
        &self.counter
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Skips the form when the browser already holds a valid session.
    pub async fn on_mount(&mut self) -> Option<Navigation> {
        match self.api.status().await {
            Ok(status) if status.authenticated => {
                self.authenticated = true;
                Some(Navigation {
                    to: self.return_to.clone(),
                    delay: ALREADY_AUTHENTICATED_DELAY,
                })
            }
            Ok(_) => None,
            Err(e) => {
                debug!("Status check failed, showing login form: {e}");
                None
            }
        }
    }

    pub async fn submit(
        &mut self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> LoginOutcome {
        if username.trim().is_empty() || password.is_empty() {
            return LoginOutcome::InvalidInput;
        }

        if let Some(minutes_left) = self.counter.minutes_left(now) {
            return LoginOutcome::Blocked { minutes_left };
        }

        match self.api.login(username, password).await {
            Ok(LoginReply::Accepted) => {
                self.counter.reset();
                self.authenticated = true;
                LoginOutcome::Success(Navigation {
                    to: self.return_to.clone(),
                    delay: SUCCESS_DELAY,
                })
            }
            Ok(LoginReply::Rejected { message }) => {
                debug!("Login rejected: {message}");
                match self.counter.record_rejection(now) {
                    Some(remaining_attempts) => LoginOutcome::Rejected { remaining_attempts },
                    None => LoginOutcome::LockedOut,
                }
            }
            Ok(LoginReply::Throttled) => {
                self.counter.block(now);
                LoginOutcome::LockedOut
            }
            Err(e) => {
                warn!("Login request failed: {e}");
                LoginOutcome::Unavailable
            }
        }
    }
}
