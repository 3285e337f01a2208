use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::{Config, Secrets};
use crate::db::Store;
use crate::services::{
    AuthService, BlogService, ContactService, LoginThrottle, SeaOrmAuthService, SeaOrmBlogService,
    SeaOrmContactService, SessionResolver, TokenCodec,
};

/// Long-lived handles shared by every request. Built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub sessions: SessionResolver,

    pub login_throttle: Arc<LoginThrottle>,

    pub auth_service: Arc<dyn AuthService>,

    pub blog_service: Arc<dyn BlogService>,

    pub contact_service: Arc<dyn ContactService>,
}

impl SharedState {
    pub async fn new(config: Config, secrets: &Secrets) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
        .context("Failed to open database")?;

        Self::with_store(config, secrets, store)
    }

    /// Wires the services around an already-open store.
    pub fn with_store(config: Config, secrets: &Secrets, store: Store) -> anyhow::Result<Self> {
        let codec = Arc::new(
            TokenCodec::new(&secrets.jwt_secret).context("Failed to initialise token signing")?,
        );

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            codec.clone(),
            Duration::from_secs(config.auth.token_ttl_seconds),
            &config.security,
        )?) as Arc<dyn AuthService>;

        let blog_service = Arc::new(SeaOrmBlogService::new(store.clone())) as Arc<dyn BlogService>;

        let contact_service =
            Arc::new(SeaOrmContactService::new(store.clone())) as Arc<dyn ContactService>;

        let login_throttle = Arc::new(LoginThrottle::new(&config.security.auth_throttle));

        Ok(Self {
            config: Arc::new(config),
            store,
            sessions: SessionResolver::new(codec),
            login_throttle,
            auth_service,
            blog_service,
            contact_service,
        })
    }
}
