//! Domain service for the contact-request inbox.

use serde::Serialize;
use thiserror::Error;

use crate::db::{ContactRequest, ContactRequestChanges, NewContactRequest};

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Contact request not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ContactError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ContactListing {
    pub contact_requests: Vec<ContactRequest>,
    pub pagination: Pagination,
}

#[async_trait::async_trait]
pub trait ContactService: Send + Sync {
    /// Files a new request with status `new`. The message must not be blank.
    async fn submit(&self, request: NewContactRequest) -> Result<ContactRequest, ContactError>;

    /// Newest first. `page` is 1-based; `limit` is clamped to the configured maximum.
    async fn list(
        &self,
        status: Option<&str>,
        page: u64,
        limit: u64,
    ) -> Result<ContactListing, ContactError>;

    async fn update(
        &self,
        id: i32,
        changes: ContactRequestChanges,
    ) -> Result<ContactRequest, ContactError>;

    async fn delete(&self, id: i32) -> Result<(), ContactError>;
}
