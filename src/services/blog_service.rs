//! Domain service for blog posts.

use serde::Deserialize;
use thiserror::Error;

use crate::db::BlogPost;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("Blog post not found")]
    NotFound,

    #[error("Slug already in use: {0}")]
    SlugConflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for BlogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Editable fields of a post, as submitted by the admin panel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogPostInput {
    pub title: String,
    /// Derived from the title when absent or blank.
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[async_trait::async_trait]
pub trait BlogService: Send + Sync {
    /// Published posts, newest first.
    async fn list_published(&self) -> Result<Vec<BlogPost>, BlogError>;

    /// A published post by slug. Drafts are reported as [`BlogError::NotFound`].
    async fn get_published(&self, slug: &str) -> Result<BlogPost, BlogError>;

    async fn list_all(&self) -> Result<Vec<BlogPost>, BlogError>;

    /// Creates a post. A colliding slug gets a random numeric suffix.
    async fn create(&self, input: BlogPostInput) -> Result<BlogPost, BlogError>;

    /// Replaces a post's fields. `published_at` is stamped on first publication and kept
    /// afterwards, even if the post is unpublished again.
    async fn update(&self, id: i32, input: BlogPostInput) -> Result<BlogPost, BlogError>;

    async fn delete(&self, id: i32) -> Result<(), BlogError>;
}
