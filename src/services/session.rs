//! Maps the raw session cookie onto an identity.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::constants::auth::ADMIN_ROLE;
use crate::services::token::{Identity, TokenCodec, VerifyError};

/// Why a request is treated as anonymous. Diagnostic only; never shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousReason {
    NoToken,
    Malformed,
    SignatureInvalid,
    Expired,
    ForeignRole,
}

impl AnonymousReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoToken => "no_token",
            Self::Malformed => "malformed",
            Self::SignatureInvalid => "signature_invalid",
            Self::Expired => "expired",
            Self::ForeignRole => "foreign_role",
        }
    }
}

impl From<VerifyError> for AnonymousReason {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Malformed => Self::Malformed,
            VerifyError::SignatureInvalid => Self::SignatureInvalid,
            VerifyError::Expired => Self::Expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous(AnonymousReason),
    Authenticated(Identity),
}

impl Session {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Anonymous(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionResolver {
    codec: Arc<TokenCodec>,
}

impl SessionResolver {
    #[must_use]
    pub const fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn resolve(&self, raw: Option<&str>, now: DateTime<Utc>) -> Session {
        let token = match raw.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Session::Anonymous(AnonymousReason::NoToken),
        };

        match self.codec.verify(token, now) {
            Ok(claims) if claims.role == ADMIN_ROLE => Session::Authenticated(claims.identity()),
            Ok(_) => Session::Anonymous(AnonymousReason::ForeignRole),
            Err(e) => Session::Anonymous(e.into()),
        }
    }
}
