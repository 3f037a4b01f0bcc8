//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::Date;

use crate::domain::posts::{AdminUser, Post};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Sort orders the public catalog accepts. `Popular` uses read time as a
/// popularity proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    #[default]
    Newest,
    Oldest,
    Popular,
}

impl PostSort {
    pub fn parse(value: &str) -> Self {
        match value {
            "oldest" => Self::Oldest,
            "popular" => Self::Popular,
            _ => Self::Newest,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

/// Offset/limit window over the filtered, sorted post set.
#[derive(Debug, Clone)]
pub struct PostListRequest {
    pub filter: PostFilter,
    pub sort: PostSort,
    pub offset: u64,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct PostListPage {
    pub items: Vec<Post>,
    pub total_count: u64,
}

#[derive(Debug, Clone)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Filtered, sorted, windowed listing; the total count covers the whole
    /// filtered set, not just the window.
    async fn list_posts(&self, request: &PostListRequest) -> Result<PostListPage, RepoError>;

    /// Every post, newest first. Feeds the admin list and the sitemap.
    async fn list_all_posts(&self) -> Result<Vec<Post>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError>;

    /// Posts sharing the author or at least one tag, newest first,
    /// excluding the post itself.
    async fn list_related(
        &self,
        post_id: i64,
        author: &str,
        tags: &[String],
        limit: u32,
    ) -> Result<Vec<Post>, RepoError>;

    /// Latest posts, newest first, excluding the given ids. Backfills the
    /// recommendation list.
    async fn list_latest_excluding(
        &self,
        exclude: &[i64],
        limit: u32,
    ) -> Result<Vec<Post>, RepoError>;

    /// Every tag in use with its usage count, most used first.
    async fn list_tag_counts(&self) -> Result<Vec<TagCount>, RepoError>;
}

/// Full column set for an insert. The slug is computed by the caller; the
/// repository surfaces the unique-constraint violation as
/// [`RepoError::Duplicate`] rather than pre-checking.
#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub publish_date: Date,
    pub read_time: i32,
    pub tags: Vec<String>,
    pub thumbnail: String,
    pub featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<Vec<String>>,
    pub canonical_url: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub twitter_image: Option<String>,
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError>;

    /// Replace the stored row with `post` (the service applies patches
    /// read-modify-write). `updated_at` is stamped here.
    async fn update_post(&self, post: &Post) -> Result<Post, RepoError>;

    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait AdminUsersRepo: Send + Sync {
    async fn find_active_by_username(&self, username: &str)
    -> Result<Option<AdminUser>, RepoError>;

    async fn record_login(&self, id: i64) -> Result<(), RepoError>;
}
