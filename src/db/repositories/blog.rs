use crate::entities::{blog_posts, prelude::BlogPosts};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

pub use crate::entities::blog_posts::Model as BlogPost;

/// Row values for a post. `published_at` is decided by the caller.
#[derive(Debug, Clone)]
pub struct BlogPostRecord {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<String>,
}

pub struct BlogRepository {
    conn: DatabaseConnection,
}

impl BlogRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, published_only: bool) -> Result<Vec<BlogPost>> {
        let mut query = BlogPosts::find()
            .order_by_desc(blog_posts::Column::CreatedAt)
            .order_by_desc(blog_posts::Column::Id);

        if published_only {
            query = query.filter(blog_posts::Column::IsPublished.eq(true));
        }

        query.all(&self.conn).await.context("Failed to list blog posts")
    }

    pub async fn get(&self, id: i32) -> Result<Option<BlogPost>> {
        BlogPosts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query blog post by ID")
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        BlogPosts::find()
            .filter(blog_posts::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query blog post by slug")
    }

    /// Whether `slug` is used by a post other than `except_id`.
    pub async fn slug_taken(&self, slug: &str, except_id: Option<i32>) -> Result<bool> {
        let mut query = BlogPosts::find().filter(blog_posts::Column::Slug.eq(slug));

        if let Some(id) = except_id {
            query = query.filter(blog_posts::Column::Id.ne(id));
        }

        let count = query
            .count(&self.conn)
            .await
            .context("Failed to check slug uniqueness")?;

        Ok(count > 0)
    }

    pub async fn create(&self, record: BlogPostRecord, now: &str) -> Result<BlogPost> {
        let model = blog_posts::ActiveModel {
            title: Set(record.title),
            slug: Set(record.slug),
            content: Set(record.content),
            excerpt: Set(record.excerpt),
            image_url: Set(record.image_url),
            is_published: Set(record.is_published),
            published_at: Set(record.published_at),
            created_at: Set(now.to_string()),
            updated_at: Set(now.to_string()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert blog post")
    }

    pub async fn update(
        &self,
        existing: BlogPost,
        record: BlogPostRecord,
        now: &str,
    ) -> Result<BlogPost> {
        let mut active: blog_posts::ActiveModel = existing.into();
        active.title = Set(record.title);
        active.slug = Set(record.slug);
        active.content = Set(record.content);
        active.excerpt = Set(record.excerpt);
        active.image_url = Set(record.image_url);
        active.is_published = Set(record.is_published);
        active.published_at = Set(record.published_at);
        active.updated_at = Set(now.to_string());

        active
            .update(&self.conn)
            .await
            .context("Failed to update blog post")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = BlogPosts::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete blog post")?;

        Ok(result.rows_affected > 0)
    }
}
