use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{admin_users, prelude::AdminUsers};

/// Administrator data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<admin_users::Model> for AdminUser {
    fn from(model: admin_users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            full_name: model.full_name,
            is_active: model.is_active,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AdminUserRepository {
    conn: DatabaseConnection,
}

impl AdminUserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model(&self, username: &str) -> Result<Option<admin_users::Model>> {
        AdminUsers::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin user by username")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        Ok(self.find_model(username).await?.map(AdminUser::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<AdminUser>> {
        let user = AdminUsers::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin user by ID")?;

        Ok(user.map(AdminUser::from))
    }

    /// Get user by username together with the stored password hash
    pub async fn get_credentials(&self, username: &str) -> Result<Option<(AdminUser, String)>> {
        Ok(self.find_model(username).await?.map(|u| {
            let password_hash = u.password_hash.clone();
            (AdminUser::from(u), password_hash)
        }))
    }

    pub async fn record_login(&self, id: i32, at: DateTime<Utc>) -> Result<()> {
        AdminUsers::update_many()
            .col_expr(admin_users::Column::LastLogin, Expr::value(at.to_rfc3339()))
            .filter(admin_users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to record last login")?;

        Ok(())
    }

    /// Create an account unless one with `username` already exists.
    /// Returns `true` when a row was inserted.
    pub async fn create_if_missing(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        if self.find_model(username).await?.is_some() {
            return Ok(false);
        }

        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = Utc::now().to_rfc3339();
        let model = admin_users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            full_name: Set(full_name.to_string()),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        model
            .insert(&self.conn)
            .await
            .context("Failed to insert admin user")?;

        Ok(true)
    }

    /// Replace the password hash. Returns `false` when the account does not exist.
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        let Some(user) = self.find_model(username).await? else {
            return Ok(false);
        };

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let mut active: admin_users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Returns `false` when the account does not exist.
    pub async fn set_active(&self, username: &str, is_active: bool) -> Result<bool> {
        let Some(user) = self.find_model(username).await? else {
            return Ok(false);
        };

        let mut active: admin_users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}

/// Hash a password with Argon2id using the configured cost params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Check `password` against a PHC hash string. Params are read from the hash itself.
/// CPU-heavy; call from a blocking task.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_hash_is_salted_and_verifiable() {
        let config = fast_params();
        let first = hash_password("correct horse", &config).unwrap();
        let second = hash_password("correct horse", &config).unwrap();

        assert_ne!(first, second);
        assert!(!first.contains("correct horse"));
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &first).unwrap());
        assert!(!verify_password("correct horsE", &first).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
