//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::constants::auth::ADMIN_ROLE;
use crate::db::Store;
use crate::db::repositories::admin_user::{hash_password, verify_password};
use crate::services::auth_service::{AdminInfo, AuthError, AuthService, LoginSuccess};
use crate::services::token::{Identity, TokenCodec};

pub struct SeaOrmAuthService {
    store: Store,
    codec: Arc<TokenCodec>,
    token_ttl: std::time::Duration,
    /// Checked when the username is unknown. Hashed with the same Argon2 params as stored
    /// accounts so both failure paths cost the same.
    dummy_hash: Arc<str>,
}

impl SeaOrmAuthService {
    pub fn new(
        store: Store,
        codec: Arc<TokenCodec>,
        token_ttl: std::time::Duration,
        security: &SecurityConfig,
    ) -> anyhow::Result<Self> {
        let dummy_hash = hash_password(&uuid::Uuid::new_v4().to_string(), security)
            .context("Failed to prepare dummy password hash")?;

        Ok(Self {
            store,
            codec,
            token_ttl,
            dummy_hash: dummy_hash.into(),
        })
    }

    async fn check_password(
        &self,
        password: &str,
        password_hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let known_user = password_hash.is_some();
        let hash = password_hash.unwrap_or_else(|| self.dummy_hash.to_string());
        let password = password.to_string();

        let matches = task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("Password verification task panicked")
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .unwrap_or_else(|e| {
                warn!("Stored password hash could not be parsed: {e}");
                false
            });

        Ok(known_user && matches)
    }
}

#[async_trait::async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let credentials = self.store.get_admin_credentials(username).await?;

        let (user, password_hash) = match credentials {
            Some((user, hash)) => (Some(user), Some(hash)),
            None => (None, None),
        };

        let password_ok = self.check_password(password, password_hash).await?;

        let user = match user {
            Some(user) if password_ok && user.is_active => user,
            Some(user) if password_ok => {
                warn!(user_id = user.id, "Login refused for inactive account");
                return Err(AuthError::InvalidCredentials);
            }
            _ => return Err(AuthError::InvalidCredentials),
        };

        let now = Utc::now();
        let identity = Identity {
            id: user.id,
            username: user.username,
            role: ADMIN_ROLE.to_string(),
        };

        let token = self
            .codec
            .issue(&identity, self.token_ttl, now)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.store.record_admin_login(identity.id, now).await?;

        let expires_at = now
            + chrono::Duration::from_std(self.token_ttl)
                .map_err(|e| AuthError::Internal(e.to_string()))?;

        info!(user_id = identity.id, "Administrator logged in");

        Ok(LoginSuccess {
            token,
            identity,
            expires_at,
        })
    }

    async fn admin_info(&self, id: i32) -> Result<Option<AdminInfo>, AuthError> {
        let user = self.store.get_admin_by_id(id).await?;

        Ok(user.map(|u| AdminInfo {
            id: u.id,
            username: u.username,
            full_name: u.full_name,
            is_active: u.is_active,
            last_login: u.last_login,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use secrecy::SecretString;
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(24 * 60 * 60);

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    async fn service_with_admin() -> (SeaOrmAuthService, Store, Arc<TokenCodec>) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store
            .create_admin_if_missing("admin", "s3cret-pass", "Administrator", &fast_security())
            .await
            .unwrap();

        let codec = Arc::new(
            TokenCodec::new(&SecretString::from("unit-test-secret-unit-test-secret".to_string()))
                .unwrap(),
        );
        let service =
            SeaOrmAuthService::new(store.clone(), codec.clone(), TTL, &fast_security()).unwrap();
        (service, store, codec)
    }

    #[tokio::test]
    async fn test_login_success_issues_admin_token_and_records_login() {
        let (service, store, codec) = service_with_admin().await;

        let success = service.login("admin", "s3cret-pass").await.unwrap();
        let claims = codec.verify(&success.token, Utc::now()).unwrap();

        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.id, success.identity.id);
        assert_eq!(claims.exp - claims.iat, 86_400);

        let user = store.get_admin_by_username("admin").await.unwrap().unwrap();
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_identical() {
        let (service, store, _) = service_with_admin().await;

        let wrong_password = service.login("admin", "nope").await.unwrap_err();
        let unknown_user = service.login("root", "s3cret-pass").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());

        let user = store.get_admin_by_username("admin").await.unwrap().unwrap();
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let (service, _, _) = service_with_admin().await;

        let err = service.login("Admin", "s3cret-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_log_in() {
        let (service, store, _) = service_with_admin().await;
        store.set_admin_active("admin", false).await.unwrap();

        let err = service.login("admin", "s3cret-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_admin_info() {
        let (service, _, _) = service_with_admin().await;
        let success = service.login("admin", "s3cret-pass").await.unwrap();

        let info = service.admin_info(success.identity.id).await.unwrap().unwrap();
        assert_eq!(info.username, "admin");
        assert_eq!(info.full_name, "Administrator");
        assert!(service.admin_info(9999).await.unwrap().is_none());
    }

    /// `m=..,t=..,p=..` segment of a PHC string.
    fn phc_params(hash: &str) -> &str {
        hash.split('$').nth(3).unwrap()
    }

    #[tokio::test]
    async fn test_dummy_hash_uses_configured_params() {
        let (service, store, _) = service_with_admin().await;
        let (_, real) = store.get_admin_credentials("admin").await.unwrap().unwrap();

        assert_eq!(phc_params(&service.dummy_hash), phc_params(&real));
        assert_eq!(phc_params(&real), "m=1024,t=1,p=1");
    }
}
