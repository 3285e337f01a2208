//! `SeaORM` implementation of the `ContactService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::{ContactRequest, ContactRequestChanges, NewContactRequest, Store};
use crate::services::contact_service::{ContactError, ContactListing, ContactService, Pagination};

pub struct SeaOrmContactService {
    store: Store,
}

impl SeaOrmContactService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContactService for SeaOrmContactService {
    async fn submit(&self, request: NewContactRequest) -> Result<ContactRequest, ContactError> {
        if request.message.trim().is_empty() {
            return Err(ContactError::Validation("Message is required".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let created = self.store.create_contact_request(request, &now).await?;

        info!(request_id = created.id, "Contact request received");
        metrics::counter!("vitrine_contact_requests_total").increment(1);

        Ok(created)
    }

    async fn list(
        &self,
        status: Option<&str>,
        page: u64,
        limit: u64,
    ) -> Result<ContactListing, ContactError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let status = status.map(str::trim).filter(|s| !s.is_empty());

        let result = self.store.list_contact_requests(status, page, limit).await?;

        Ok(ContactListing {
            contact_requests: result.items,
            pagination: Pagination {
                total: result.total,
                page,
                limit,
                pages: result.total.div_ceil(limit),
            },
        })
    }

    async fn update(
        &self,
        id: i32,
        changes: ContactRequestChanges,
    ) -> Result<ContactRequest, ContactError> {
        if changes
            .message
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(ContactError::Validation("Message cannot be blank".to_string()));
        }

        let existing = self
            .store
            .get_contact_request(id)
            .await?
            .ok_or(ContactError::NotFound)?;

        let now = Utc::now().to_rfc3339();
        Ok(self.store.update_contact_request(existing, changes, &now).await?)
    }

    async fn delete(&self, id: i32) -> Result<(), ContactError> {
        if !self.store.delete_contact_request(id).await? {
            return Err(ContactError::NotFound);
        }
        info!(request_id = id, "Contact request deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmContactService {
        SeaOrmContactService::new(Store::new("sqlite::memory:").await.unwrap())
    }

    fn request(message: &str) -> NewContactRequest {
        NewContactRequest {
            name: Some("Ivan".to_string()),
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_sets_status_new() {
        let service = service().await;
        let created = service.submit(request("Call me back")).await.unwrap();
        assert_eq!(created.status, "new");
        assert_eq!(created.name.as_deref(), Some("Ivan"));
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let service = service().await;
        assert!(matches!(
            service.submit(request("   ")).await,
            Err(ContactError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_pagination_metadata() {
        let service = service().await;
        for i in 0..7 {
            service.submit(request(&format!("m{i}"))).await.unwrap();
        }

        let listing = service.list(None, 2, 3).await.unwrap();
        assert_eq!(listing.contact_requests.len(), 3);
        assert_eq!(
            listing.pagination,
            Pagination {
                total: 7,
                page: 2,
                limit: 3,
                pages: 3
            }
        );

        let clamped = service.list(Some(""), 0, 0).await.unwrap();
        assert_eq!(clamped.pagination.page, 1);
        assert_eq!(clamped.pagination.limit, 1);
        assert_eq!(clamped.pagination.pages, 7);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = service().await;
        let created = service.submit(request("hello")).await.unwrap();

        let updated = service
            .update(
                created.id,
                ContactRequestChanges {
                    status: Some("in_progress".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "in_progress");
        assert_eq!(updated.message, "hello");

        assert!(matches!(
            service.update(404, ContactRequestChanges::default()).await,
            Err(ContactError::NotFound)
        ));

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.delete(created.id).await,
            Err(ContactError::NotFound)
        ));
    }
}
