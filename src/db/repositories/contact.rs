use crate::entities::{contact_requests, prelude::ContactRequests};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

pub use crate::entities::contact_requests::Model as ContactRequest;

pub const STATUS_NEW: &str = "new";

#[derive(Debug, Clone, Default)]
pub struct NewContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ContactRequestChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
}

pub struct ContactPage {
    pub items: Vec<ContactRequest>,
    pub total: u64,
}

pub struct ContactRepository {
    conn: DatabaseConnection,
}

impl ContactRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, request: NewContactRequest, now: &str) -> Result<ContactRequest> {
        let model = contact_requests::ActiveModel {
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            message: Set(request.message),
            status: Set(STATUS_NEW.to_string()),
            created_at: Set(now.to_string()),
            updated_at: Set(now.to_string()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert contact request")
    }

    /// `page` is 1-based.
    pub async fn list(
        &self,
        status: Option<&str>,
        page: u64,
        page_size: u64,
    ) -> Result<ContactPage> {
        let mut query = ContactRequests::find()
            .order_by_desc(contact_requests::Column::CreatedAt)
            .order_by_desc(contact_requests::Column::Id);

        if let Some(status) = status {
            query = query.filter(contact_requests::Column::Status.eq(status));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total = paginator
            .num_items()
            .await
            .context("Failed to count contact requests")?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch contact requests")?;

        Ok(ContactPage { items, total })
    }

    pub async fn get(&self, id: i32) -> Result<Option<ContactRequest>> {
        ContactRequests::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query contact request")
    }

    pub async fn update(
        &self,
        existing: ContactRequest,
        changes: ContactRequestChanges,
        now: &str,
    ) -> Result<ContactRequest> {
        let mut active: contact_requests::ActiveModel = existing.into();

        if let Some(name) = changes.name {
            active.name = Set(Some(name));
        }
        if let Some(email) = changes.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(message) = changes.message {
            active.message = Set(message);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        active.updated_at = Set(now.to_string());

        active
            .update(&self.conn)
            .await
            .context("Failed to update contact request")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = ContactRequests::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete contact request")?;

        Ok(result.rows_affected > 0)
    }
}
