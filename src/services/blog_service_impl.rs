//! `SeaORM` implementation of the `BlogService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::db::{BlogPost, BlogPostRecord, Store};
use crate::services::blog_service::{BlogError, BlogPostInput, BlogService};
use crate::services::slug::{slugify, with_random_suffix};

/// Random suffixes tried before giving up on a colliding slug.
const SUFFIX_ATTEMPTS: usize = 5;

pub struct SeaOrmBlogService {
    store: Store,
}

impl SeaOrmBlogService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn validate(input: &BlogPostInput) -> Result<(), BlogError> {
        if input.title.trim().is_empty() {
            return Err(BlogError::Validation("Title is required".to_string()));
        }
        if input.content.trim().is_empty() {
            return Err(BlogError::Validation("Content is required".to_string()));
        }
        Ok(())
    }

    fn requested_slug(input: &BlogPostInput) -> Option<String> {
        input
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    }

    async fn unique_slug(&self, base: String) -> Result<String, BlogError> {
        if !self.store.blog_slug_taken(&base, None).await? {
            return Ok(base);
        }

        for _ in 0..SUFFIX_ATTEMPTS {
            let candidate = with_random_suffix(&base);
            if !self.store.blog_slug_taken(&candidate, None).await? {
                return Ok(candidate);
            }
        }

        Err(BlogError::SlugConflict(base))
    }
}

#[async_trait]
impl BlogService for SeaOrmBlogService {
    async fn list_published(&self) -> Result<Vec<BlogPost>, BlogError> {
        Ok(self.store.list_blog_posts(true).await?)
    }

    async fn get_published(&self, slug: &str) -> Result<BlogPost, BlogError> {
        self.store
            .get_blog_post_by_slug(slug)
            .await?
            .filter(|post| post.is_published)
            .ok_or(BlogError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<BlogPost>, BlogError> {
        Ok(self.store.list_blog_posts(false).await?)
    }

    async fn create(&self, input: BlogPostInput) -> Result<BlogPost, BlogError> {
        Self::validate(&input)?;

        let base = Self::requested_slug(&input).unwrap_or_else(|| slugify(&input.title));
        if base.is_empty() {
            return Err(BlogError::Validation(
                "Title does not produce a usable slug; provide one explicitly".to_string(),
            ));
        }
        let slug = self.unique_slug(base).await?;

        let now = Utc::now().to_rfc3339();
        let record = BlogPostRecord {
            title: input.title,
            slug,
            content: input.content,
            excerpt: input.excerpt,
            image_url: input.image_url,
            is_published: input.is_published,
            published_at: input.is_published.then(|| now.clone()),
        };

        let post = self.store.create_blog_post(record, &now).await?;
        info!(post_id = post.id, slug = %post.slug, "Blog post created");
        Ok(post)
    }

    async fn update(&self, id: i32, input: BlogPostInput) -> Result<BlogPost, BlogError> {
        Self::validate(&input)?;

        let existing = self
            .store
            .get_blog_post(id)
            .await?
            .ok_or(BlogError::NotFound)?;

        let slug = Self::requested_slug(&input).unwrap_or_else(|| existing.slug.clone());
        if slug != existing.slug && self.store.blog_slug_taken(&slug, Some(id)).await? {
            return Err(BlogError::SlugConflict(slug));
        }

        let now = Utc::now().to_rfc3339();
        let published_at = match &existing.published_at {
            Some(at) => Some(at.clone()),
            None => input.is_published.then(|| now.clone()),
        };

        let record = BlogPostRecord {
            title: input.title,
            slug,
            content: input.content,
            excerpt: input.excerpt,
            image_url: input.image_url,
            is_published: input.is_published,
            published_at,
        };

        let post = self.store.update_blog_post(existing, record, &now).await?;
        info!(post_id = post.id, "Blog post updated");
        Ok(post)
    }

    async fn delete(&self, id: i32) -> Result<(), BlogError> {
        if !self.store.delete_blog_post(id).await? {
            return Err(BlogError::NotFound);
        }
        info!(post_id = id, "Blog post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmBlogService {
        SeaOrmBlogService::new(Store::new("sqlite::memory:").await.unwrap())
    }

    fn input(title: &str, published: bool) -> BlogPostInput {
        BlogPostInput {
            title: title.to_string(),
            content: "Body".to_string(),
            is_published: published,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_suffixes_collisions() {
        let service = service().await;

        let first = service.create(input("Новости компании", true)).await.unwrap();
        assert_eq!(first.slug, "novosti-kompanii");
        assert!(first.published_at.is_some());

        let second = service.create(input("Новости компании", false)).await.unwrap();
        assert_ne!(second.slug, first.slug);
        assert!(second.slug.starts_with("novosti-kompanii-"));
        assert!(second.published_at.is_none());
    }

    #[tokio::test]
    async fn test_published_filtering() {
        let service = service().await;
        service.create(input("Live", true)).await.unwrap();
        let draft = service.create(input("Draft", false)).await.unwrap();

        let public = service.list_published().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].slug, "live");
        assert_eq!(service.list_all().await.unwrap().len(), 2);

        assert!(service.get_published("live").await.is_ok());
        assert!(matches!(
            service.get_published(&draft.slug).await,
            Err(BlogError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_published_at_set_once() {
        let service = service().await;
        let post = service.create(input("Later", false)).await.unwrap();
        assert!(post.published_at.is_none());

        let published = service.update(post.id, input("Later", true)).await.unwrap();
        let stamped = published.published_at.clone();
        assert!(stamped.is_some());

        let unpublished = service.update(post.id, input("Later", false)).await.unwrap();
        assert!(!unpublished.is_published);
        assert_eq!(unpublished.published_at, stamped);

        let republished = service.update(post.id, input("Later", true)).await.unwrap();
        assert_eq!(republished.published_at, stamped);
    }

    #[tokio::test]
    async fn test_update_slug_conflict_and_missing() {
        let service = service().await;
        service.create(input("First", true)).await.unwrap();
        let second = service.create(input("Second", true)).await.unwrap();

        let mut taken = input("Second", true);
        taken.slug = Some("first".to_string());
        assert!(matches!(
            service.update(second.id, taken).await,
            Err(BlogError::SlugConflict(_))
        ));

        assert!(matches!(
            service.update(999, input("Nope", true)).await,
            Err(BlogError::NotFound)
        ));
        assert!(matches!(service.delete(999).await, Err(BlogError::NotFound)));
        assert!(service.delete(second.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_validation() {
        let service = service().await;
        assert!(matches!(
            service.create(input("  ", true)).await,
            Err(BlogError::Validation(_))
        ));
        assert!(matches!(
            service.create(input("!!!", true)).await,
            Err(BlogError::Validation(_))
        ));
    }
}
