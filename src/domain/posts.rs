//! Post entity and the admin-facing create/patch payloads.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::domain::error::DomainError;

/// A single blog article with content, display metadata and optional SEO
/// shadow fields. Field names on the wire follow the public API's camelCase
/// convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
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

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Payload for creating a post. The slug is never supplied; it is derived
/// from the title by the admin service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub publish_date: Option<Date>,
    pub read_time: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
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

impl NewPost {
    /// Reject payloads the editor should never send: blank required fields
    /// or a non-positive read time.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("title", &self.title),
            ("excerpt", &self.excerpt),
            ("content", &self.content),
            ("author", &self.author),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("`{name}` must not be empty")));
            }
        }
        if let Some(read_time) = self.read_time
            && read_time < 1
        {
            return Err(DomainError::validation("`readTime` must be at least 1 minute"));
        }
        Ok(())
    }
}

/// Partial update payload. `None` means "leave unchanged"; the slug is
/// recomputed only when `title` is present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub publish_date: Option<Date>,
    pub read_time: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub featured: Option<bool>,

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

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.excerpt.is_none()
            && self.content.is_none()
            && self.author.is_none()
            && self.publish_date.is_none()
            && self.read_time.is_none()
            && self.tags.is_none()
            && self.thumbnail.is_none()
            && self.featured.is_none()
            && self.meta_title.is_none()
            && self.meta_description.is_none()
            && self.meta_keywords.is_none()
            && self.canonical_url.is_none()
            && self.og_title.is_none()
            && self.og_description.is_none()
            && self.og_image.is_none()
            && self.twitter_title.is_none()
            && self.twitter_description.is_none()
            && self.twitter_image.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("title", &self.title),
            ("excerpt", &self.excerpt),
            ("content", &self.content),
            ("author", &self.author),
        ] {
            if let Some(value) = value
                && value.trim().is_empty()
            {
                return Err(DomainError::validation(format!("`{name}` must not be empty")));
            }
        }
        if let Some(read_time) = self.read_time
            && read_time < 1
        {
            return Err(DomainError::validation("`readTime` must be at least 1 minute"));
        }
        Ok(())
    }
}

/// An administrator account. Passwords are stored as Argon2 PHC strings and
/// never leave the infrastructure layer.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<OffsetDateTime>,
}
