use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::admin_user::AdminUser;
pub use repositories::blog::{BlogPost, BlogPostRecord};
pub use repositories::contact::{
    ContactPage, ContactRequest, ContactRequestChanges, NewContactRequest,
};

/// The single pooled handle to the database, cloned into every service and handler.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Drain the pool. Called once on shutdown.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        info!("Database connections closed");
        Ok(())
    }

    fn admin_repo(&self) -> repositories::admin_user::AdminUserRepository {
        repositories::admin_user::AdminUserRepository::new(self.conn.clone())
    }

    fn blog_repo(&self) -> repositories::blog::BlogRepository {
        repositories::blog::BlogRepository::new(self.conn.clone())
    }

    fn contact_repo(&self) -> repositories::contact::ContactRepository {
        repositories::contact::ContactRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Admin accounts
    // ========================================================================

    pub async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        self.admin_repo().get_by_username(username).await
    }

    pub async fn get_admin_by_id(&self, id: i32) -> Result<Option<AdminUser>> {
        self.admin_repo().get_by_id(id).await
    }

    pub async fn get_admin_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(AdminUser, String)>> {
        self.admin_repo().get_credentials(username).await
    }

    pub async fn record_admin_login(&self, id: i32, at: DateTime<Utc>) -> Result<()> {
        self.admin_repo().record_login(id, at).await
    }

    pub async fn create_admin_if_missing(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        self.admin_repo()
            .create_if_missing(username, password, full_name, config)
            .await
    }

    pub async fn update_admin_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        self.admin_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn set_admin_active(&self, username: &str, is_active: bool) -> Result<bool> {
        self.admin_repo().set_active(username, is_active).await
    }

    // ========================================================================
    // Blog
    // ========================================================================

    pub async fn list_blog_posts(&self, published_only: bool) -> Result<Vec<BlogPost>> {
        self.blog_repo().list(published_only).await
    }

    pub async fn get_blog_post(&self, id: i32) -> Result<Option<BlogPost>> {
        self.blog_repo().get(id).await
    }

    pub async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        self.blog_repo().get_by_slug(slug).await
    }

    pub async fn blog_slug_taken(&self, slug: &str, except_id: Option<i32>) -> Result<bool> {
        self.blog_repo().slug_taken(slug, except_id).await
    }

    pub async fn create_blog_post(&self, record: BlogPostRecord, now: &str) -> Result<BlogPost> {
        self.blog_repo().create(record, now).await
    }

    pub async fn update_blog_post(
        &self,
        existing: BlogPost,
        record: BlogPostRecord,
        now: &str,
    ) -> Result<BlogPost> {
        self.blog_repo().update(existing, record, now).await
    }

    pub async fn delete_blog_post(&self, id: i32) -> Result<bool> {
        self.blog_repo().delete(id).await
    }

    // ========================================================================
    // Contact requests
    // ========================================================================

    pub async fn create_contact_request(
        &self,
        request: NewContactRequest,
        now: &str,
    ) -> Result<ContactRequest> {
        self.contact_repo().create(request, now).await
    }

    pub async fn list_contact_requests(
        &self,
        status: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<ContactPage> {
        self.contact_repo().list(status, page, page_size).await
    }

    pub async fn get_contact_request(&self, id: i32) -> Result<Option<ContactRequest>> {
        self.contact_repo().get(id).await
    }

    pub async fn update_contact_request(
        &self,
        existing: ContactRequest,
        changes: ContactRequestChanges,
        now: &str,
    ) -> Result<ContactRequest> {
        self.contact_repo().update(existing, changes, now).await
    }

    pub async fn delete_contact_request(&self, id: i32) -> Result<bool> {
        self.contact_repo().delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    #[tokio::test]
    async fn test_create_admin_is_idempotent() {
        let store = memory_store().await;
        let security = fast_security();

        assert!(
            store
                .create_admin_if_missing("admin", "first-secret", "Administrator", &security)
                .await
                .unwrap()
        );
        assert!(
            !store
                .create_admin_if_missing("admin", "second-secret", "Someone Else", &security)
                .await
                .unwrap()
        );

        let (user, hash) = store.get_admin_credentials("admin").await.unwrap().unwrap();
        assert_eq!(user.full_name, "Administrator");
        assert!(user.is_active);
        assert!(user.last_login.is_none());
        assert!(
            repositories::admin_user::verify_password("first-secret", &hash).unwrap()
        );
    }

    #[tokio::test]
    async fn test_update_password_and_last_login() {
        let store = memory_store().await;
        let security = fast_security();
        store
            .create_admin_if_missing("admin", "old-secret", "Administrator", &security)
            .await
            .unwrap();

        assert!(
            store
                .update_admin_password("admin", "new-secret", &security)
                .await
                .unwrap()
        );
        assert!(
            !store
                .update_admin_password("ghost", "new-secret", &security)
                .await
                .unwrap()
        );

        let (user, hash) = store.get_admin_credentials("admin").await.unwrap().unwrap();
        assert!(repositories::admin_user::verify_password("new-secret", &hash).unwrap());
        assert!(!repositories::admin_user::verify_password("old-secret", &hash).unwrap());

        let at = Utc::now();
        store.record_admin_login(user.id, at).await.unwrap();
        let user = store.get_admin_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.last_login, Some(at.to_rfc3339()));
    }

    #[tokio::test]
    async fn test_contact_pagination_and_status_filter() {
        let store = memory_store().await;

        for i in 0..5 {
            store
                .create_contact_request(
                    NewContactRequest {
                        message: format!("message {i}"),
                        ..Default::default()
                    },
                    &format!("2025-01-0{}T00:00:00+00:00", i + 1),
                )
                .await
                .unwrap();
        }

        let page = store.list_contact_requests(None, 1, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].message, "message 4");

        let last = store.list_contact_requests(None, 3, 2).await.unwrap();
        assert_eq!(last.items.len(), 1);

        let first = page.items[0].clone();
        store
            .update_contact_request(
                first,
                ContactRequestChanges {
                    status: Some("done".to_string()),
                    ..Default::default()
                },
                "2025-02-01T00:00:00+00:00",
            )
            .await
            .unwrap();

        let done = store.list_contact_requests(Some("done"), 1, 10).await.unwrap();
        assert_eq!(done.total, 1);
        assert_eq!(done.items[0].message, "message 4");

        let fresh = store.list_contact_requests(Some("new"), 1, 10).await.unwrap();
        assert_eq!(fresh.total, 4);
    }
}
