use secrecy::ExposeSecret;
use tracing::info;

use crate::config::{Config, admin_password_from_env};
use crate::constants::auth::{RESERVED_ADMIN_FULL_NAME, RESERVED_ADMIN_USERNAME};
use crate::db::Store;

pub async fn cmd_seed_admin(config: &Config) -> anyhow::Result<()> {
    let password = admin_password_from_env()?;
    let store = Store::new(&config.general.database_path).await?;

    let created = store
        .create_admin_if_missing(
            RESERVED_ADMIN_USERNAME,
            password.expose_secret(),
            RESERVED_ADMIN_FULL_NAME,
            &config.security,
        )
        .await?;

    if created {
        info!(username = RESERVED_ADMIN_USERNAME, "Administrator account created");
        println!("✓ Created administrator '{RESERVED_ADMIN_USERNAME}'");
    } else {
        println!("Administrator '{RESERVED_ADMIN_USERNAME}' already exists, nothing to do.");
    }

    store.close().await
}

pub async fn cmd_set_admin_password(config: &Config) -> anyhow::Result<()> {
    let password = admin_password_from_env()?;
    let store = Store::new(&config.general.database_path).await?;

    let updated = store
        .update_admin_password(
            RESERVED_ADMIN_USERNAME,
            password.expose_secret(),
            &config.security,
        )
        .await?;

    store.close().await?;

    if !updated {
        anyhow::bail!(
            "Administrator '{RESERVED_ADMIN_USERNAME}' does not exist; \
             run `vitrine seed-admin` first"
        );
    }

    info!(username = RESERVED_ADMIN_USERNAME, "Administrator password rotated");
    println!("✓ Password updated for '{RESERVED_ADMIN_USERNAME}'");
    Ok(())
}

pub async fn cmd_set_admin_active(
    config: &Config,
    username: &str,
    is_active: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let result = set_admin_active(&store, username, is_active).await;
    store.close().await?;

    let state = if is_active { "active" } else { "inactive" };
    if result? {
        info!(username, is_active, "Administrator account status changed");
        println!("✓ Administrator '{username}' is now {state}");
    } else {
        println!("Administrator '{username}' is already {state}, nothing to do.");
    }
    Ok(())
}

/// Returns `false` when the account already had the requested state.
async fn set_admin_active(
    store: &Store,
    username: &str,
    is_active: bool,
) -> anyhow::Result<bool> {
    let Some(user) = store.get_admin_by_username(username).await? else {
        anyhow::bail!("Administrator '{username}' does not exist");
    };

    if user.is_active == is_active {
        return Ok(false);
    }

    store.set_admin_active(username, is_active).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;

    async fn store_with_admin() -> Store {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        store
            .create_admin_if_missing("admin", "s3cret-pass", "Administrator", &security)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let store = store_with_admin().await;

        assert!(set_admin_active(&store, "admin", false).await.unwrap());
        assert!(!set_admin_active(&store, "admin", false).await.unwrap());
        let user = store.get_admin_by_username("admin").await.unwrap().unwrap();
        assert!(!user.is_active);

        assert!(set_admin_active(&store, "admin", true).await.unwrap());
        let user = store.get_admin_by_username("admin").await.unwrap().unwrap();
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_unknown_account_is_an_error() {
        let store = store_with_admin().await;
        assert!(set_admin_active(&store, "ghost", false).await.is_err());
    }
}
