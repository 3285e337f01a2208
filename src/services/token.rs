//! Signed, time-limited session tokens.
//!
//! Tokens are HS256 JWTs carrying `{id, username, role, iat, exp}`. Expiry is checked
//! against an explicit `now` so verification is a pure function of token, secret and clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who the token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i32,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    pub role: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds); the token is dead from this instant on
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,

    #[error("invalid token lifetime")]
    InvalidTtl,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        // Expiry is compared against the caller's clock in `verify`, not the system clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        })
    }

    pub fn issue(
        &self,
        identity: &Identity,
        ttl: std::time::Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = Duration::from_std(ttl).map_err(|_| TokenError::InvalidTtl)?;
        let issued_at = now.timestamp();
        let expires_at = issued_at
            .checked_add(ttl.num_seconds())
            .ok_or(TokenError::InvalidTtl)?;

        let claims = Claims {
            id: identity.id,
            username: identity.username.clone(),
            role: identity.role.clone(),
            iat: issued_at,
            exp: expires_at,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, VerifyError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerifyError::SignatureInvalid,
                _ => VerifyError::Malformed,
            })?;

        if now.timestamp() >= claims.exp {
            return Err(VerifyError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    const TTL: StdDuration = StdDuration::from_secs(24 * 60 * 60);

    fn codec_for(secret: &str) -> TokenCodec {
        TokenCodec::new(&SecretString::from(secret.to_string())).unwrap()
    }

    fn admin() -> Identity {
        Identity {
            id: 7,
            username: "admin".to_string(),
            role: "admin".to_string(),
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    #[test]
    fn test_empty_secret_is_refused() {
        let err = TokenCodec::new(&SecretString::from(String::new())).unwrap_err();
        assert!(matches!(err, TokenError::EmptySecret));
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let codec = codec_for("a-long-enough-test-secret-value-123");
        let token = codec.issue(&admin(), TTL, t0()).unwrap();

        let claims = codec.verify(&token, t0()).unwrap();
        assert_eq!(claims.identity(), admin());
        assert_eq!(claims.iat, t0().timestamp());
        assert_eq!(claims.exp, t0().timestamp() + 86_400);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec_for("a-long-enough-test-secret-value-123");
        let token = codec.issue(&admin(), TTL, t0()).unwrap();

        let last_valid = t0() + Duration::seconds(86_399);
        let boundary = t0() + Duration::seconds(86_400);

        assert!(codec.verify(&token, last_valid).is_ok());
        assert_eq!(codec.verify(&token, boundary), Err(VerifyError::Expired));
        assert_eq!(
            codec.verify(&token, boundary + Duration::days(30)),
            Err(VerifyError::Expired)
        );
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let ours = codec_for("a-long-enough-test-secret-value-123");
        let theirs = codec_for("some-other-secret-nobody-configured");
        let token = theirs.issue(&admin(), TTL, t0()).unwrap();

        assert_eq!(ours.verify(&token, t0()), Err(VerifyError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let codec = codec_for("a-long-enough-test-secret-value-123");
        let token = codec.issue(&admin(), TTL, t0()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        // Splice in a payload minted elsewhere, keeping our signature.
        let other = codec_for("a-different-secret-for-the-forgery");
        let promoted = Identity {
            id: 1,
            ..admin()
        };
        let donor = other.issue(&promoted, TTL, t0()).unwrap();
        let forged_payload = donor.split('.').nth(1).unwrap();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(codec.verify(&forged, t0()), Err(VerifyError::SignatureInvalid));

        // Flip every byte of the payload segment in turn.
        let payload = parts[1].as_bytes();
        for i in 0..payload.len() {
            let mut mutated = payload.to_vec();
            mutated[i] = if mutated[i] == b'A' { b'B' } else { b'A' };
            let candidate = format!(
                "{}.{}.{}",
                parts[0],
                String::from_utf8(mutated).unwrap(),
                parts[2]
            );
            if candidate != token {
                assert!(codec.verify(&candidate, t0()).is_err(), "byte {i} accepted");
            }
        }
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec_for("a-long-enough-test-secret-value-123");
        for input in ["", "abc", "a.b", "a.b.c", "....", "eyJhbGciOiJub25lIn0.e30."] {
            assert_eq!(
                codec.verify(input, t0()),
                Err(VerifyError::Malformed),
                "input {input:?}"
            );
        }
    }
}
