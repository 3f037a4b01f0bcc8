//! Admin post management: create, update, delete and the admin listing.
//!
//! Slugs are derived here (create, and update when the patch carries a
//! title). Collisions are left to the posts table's unique constraint;
//! the resulting [`RepoError::Duplicate`] surfaces as a conflict.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::info;

use crate::application::error::AppError;
use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, RepoError};
use crate::domain::posts::{NewPost, Post, PostPatch};
use crate::domain::slug::generate_slug;

const DEFAULT_READ_TIME_MINUTES: i32 = 5;

#[derive(Clone)]
pub struct AdminPostService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
}

impl AdminPostService {
    pub fn new(posts: Arc<dyn PostsRepo>, posts_write: Arc<dyn PostsWriteRepo>) -> Self {
        Self { posts, posts_write }
    }

    pub async fn create(&self, new_post: NewPost) -> Result<Post, AppError> {
        new_post.validate()?;

        let slug = generate_slug(&new_post.title);
        if slug.is_empty() {
            return Err(AppError::validation(
                "title does not produce a usable slug",
            ));
        }

        let params = CreatePostParams {
            slug: slug.clone(),
            title: new_post.title.trim().to_string(),
            excerpt: new_post.excerpt.trim().to_string(),
            content: new_post.content.trim().to_string(),
            author: new_post.author.trim().to_string(),
            publish_date: new_post
                .publish_date
                .unwrap_or_else(|| OffsetDateTime::now_utc().date()),
            read_time: new_post.read_time.unwrap_or(DEFAULT_READ_TIME_MINUTES),
            tags: new_post.tags,
            thumbnail: new_post.thumbnail.unwrap_or_default(),
            featured: new_post.featured,
            meta_title: new_post.meta_title,
            meta_description: new_post.meta_description,
            meta_keywords: new_post.meta_keywords,
            canonical_url: new_post.canonical_url,
            og_title: new_post.og_title,
            og_description: new_post.og_description,
            og_image: new_post.og_image,
            twitter_title: new_post.twitter_title,
            twitter_description: new_post.twitter_description,
            twitter_image: new_post.twitter_image,
        };

        let post = self.posts_write.create_post(params).await?;
        info!(
            target = "kalem::admin::posts",
            id = post.id,
            slug = %post.slug,
            "post created"
        );
        Ok(post)
    }

    pub async fn update(&self, id: i64, patch: PostPatch) -> Result<Post, AppError> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(AppError::validation("update payload is empty"));
        }

        let existing = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;

        let updated = apply_patch(existing, patch)?;
        let post = self.posts_write.update_post(&updated).await?;
        info!(
            target = "kalem::admin::posts",
            id = post.id,
            slug = %post.slug,
            "post updated"
        );
        Ok(post)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        match self.posts_write.delete_post(id).await {
            Ok(()) => {
                info!(target = "kalem::admin::posts", id, "post deleted");
                Ok(())
            }
            Err(RepoError::NotFound) => Err(AppError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Post, AppError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Post>, AppError> {
        Ok(self.posts.list_all_posts().await?)
    }
}

/// Merge a partial patch into the stored post. The slug is recomputed only
/// when the patch carries a title, matching the create-time derivation.
fn apply_patch(mut post: Post, patch: PostPatch) -> Result<Post, AppError> {
    if let Some(title) = patch.title {
        let slug = generate_slug(&title);
        if slug.is_empty() {
            return Err(AppError::validation(
                "title does not produce a usable slug",
            ));
        }
        post.title = title.trim().to_string();
        post.slug = slug;
    }
    if let Some(excerpt) = patch.excerpt {
        post.excerpt = excerpt.trim().to_string();
    }
    if let Some(content) = patch.content {
        post.content = content.trim().to_string();
    }
    if let Some(author) = patch.author {
        post.author = author.trim().to_string();
    }
    if let Some(publish_date) = patch.publish_date {
        post.publish_date = publish_date;
    }
    if let Some(read_time) = patch.read_time {
        post.read_time = read_time;
    }
    if let Some(tags) = patch.tags {
        post.tags = tags;
    }
    if let Some(thumbnail) = patch.thumbnail {
        post.thumbnail = thumbnail;
    }
    if let Some(featured) = patch.featured {
        post.featured = featured;
    }

    // Shadow fields: present-and-empty clears the override back to the
    // fallback behavior.
    let clear_or_set = |value: Option<String>, slot: &mut Option<String>| {
        if let Some(value) = value {
            *slot = if value.trim().is_empty() { None } else { Some(value) };
        }
    };
    clear_or_set(patch.meta_title, &mut post.meta_title);
    clear_or_set(patch.meta_description, &mut post.meta_description);
    clear_or_set(patch.canonical_url, &mut post.canonical_url);
    clear_or_set(patch.og_title, &mut post.og_title);
    clear_or_set(patch.og_description, &mut post.og_description);
    clear_or_set(patch.og_image, &mut post.og_image);
    clear_or_set(patch.twitter_title, &mut post.twitter_title);
    clear_or_set(patch.twitter_description, &mut post.twitter_description);
    clear_or_set(patch.twitter_image, &mut post.twitter_image);
    if let Some(keywords) = patch.meta_keywords {
        post.meta_keywords = if keywords.is_empty() { None } else { Some(keywords) };
    }

    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn stored_post() -> Post {
        Post {
            id: 1,
            slug: "eski-baslik".into(),
            title: "Eski Başlık".into(),
            excerpt: "Özet".into(),
            content: "<p>...</p>".into(),
            author: "Ayşe".into(),
            publish_date: date!(2024 - 01 - 01),
            read_time: 5,
            tags: vec!["a".into()],
            thumbnail: String::new(),
            featured: false,
            meta_title: Some("Özel meta".into()),
            meta_description: None,
            meta_keywords: None,
            canonical_url: None,
            og_title: None,
            og_description: None,
            og_image: None,
            twitter_title: None,
            twitter_description: None,
            twitter_image: None,
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn patch_with_title_recomputes_slug() {
        let patch = PostPatch {
            title: Some("Yeni Başlık".into()),
            ..PostPatch::default()
        };
        let updated = apply_patch(stored_post(), patch).expect("patch");
        assert_eq!(updated.slug, "yeni-baslik");
        assert_eq!(updated.title, "Yeni Başlık");
    }

    #[test]
    fn patch_without_title_keeps_slug() {
        let patch = PostPatch {
            excerpt: Some("Yeni özet".into()),
            featured: Some(true),
            ..PostPatch::default()
        };
        let updated = apply_patch(stored_post(), patch).expect("patch");
        assert_eq!(updated.slug, "eski-baslik");
        assert_eq!(updated.excerpt, "Yeni özet");
        assert!(updated.featured);
    }

    #[test]
    fn unsluggable_title_is_rejected() {
        let patch = PostPatch {
            title: Some("!!!".into()),
            ..PostPatch::default()
        };
        assert!(apply_patch(stored_post(), patch).is_err());
    }

    #[test]
    fn empty_shadow_value_clears_the_override() {
        let patch = PostPatch {
            meta_title: Some(String::new()),
            og_title: Some("OG".into()),
            ..PostPatch::default()
        };
        let updated = apply_patch(stored_post(), patch).expect("patch");
        assert_eq!(updated.meta_title, None);
        assert_eq!(updated.og_title.as_deref(), Some("OG"));
    }
}
