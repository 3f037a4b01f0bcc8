//! SEO shadow fields: fallback resolution for rendering and the editor's
//! auto-sync rule as a pure reducer.
//!
//! Every shadow field is optional on [`Post`]; consumers render through
//! [`ResolvedSeo`], which applies the fallback table (title feeds
//! meta/og/twitter titles, excerpt feeds the descriptions, thumbnail feeds
//! the images, tags feed the keywords).

use serde::{Deserialize, Serialize};

use crate::domain::posts::Post;
use crate::domain::slug::generate_slug;

/// Fully-resolved metadata for a post's `<head>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSeo {
    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: Vec<String>,
    pub canonical_url: Option<String>,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub twitter_title: String,
    pub twitter_description: String,
    pub twitter_image: String,
}

impl ResolvedSeo {
    pub fn resolve(post: &Post) -> Self {
        let fallback = |shadow: &Option<String>, primary: &str| {
            shadow
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(primary)
                .to_string()
        };

        Self {
            meta_title: fallback(&post.meta_title, &post.title),
            meta_description: fallback(&post.meta_description, &post.excerpt),
            meta_keywords: post
                .meta_keywords
                .clone()
                .filter(|keywords| !keywords.is_empty())
                .unwrap_or_else(|| post.tags.clone()),
            canonical_url: post.canonical_url.clone(),
            og_title: fallback(&post.og_title, &post.title),
            og_description: fallback(&post.og_description, &post.excerpt),
            og_image: fallback(&post.og_image, &post.thumbnail),
            twitter_title: fallback(&post.twitter_title, &post.title),
            twitter_description: fallback(&post.twitter_description, &post.excerpt),
            twitter_image: fallback(&post.twitter_image, &post.thumbnail),
        }
    }
}

/// The editor's working state: primary fields plus their SEO mirrors.
///
/// The admin UI keeps shadow fields in lockstep with the primary fields
/// while the author has not customized them. That convenience lives here as
/// a reducer over this state so it can be exercised without any UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoEditorState {
    pub title: String,
    pub excerpt: String,
    pub thumbnail: String,
    pub tags: Vec<String>,

    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: Vec<String>,
    pub canonical_url: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub twitter_title: String,
    pub twitter_description: String,
    pub twitter_image: String,
}

/// Which primary field the author just edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeoSourceChange {
    Title(String),
    Excerpt(String),
    Thumbnail(String),
    Tags(Vec<String>),
}

/// Apply one primary-field edit, mirroring it into each shadow field that is
/// still empty or still equal to the previous primary value. Customized
/// shadow fields are left alone.
pub fn sync_seo(state: &SeoEditorState, change: SeoSourceChange, base_url: &str) -> SeoEditorState {
    let mut next = state.clone();

    let mirror = |target: &mut String, previous: &str, value: &str| {
        if target.is_empty() || target == previous {
            *target = value.to_string();
        }
    };

    match change {
        SeoSourceChange::Title(value) => {
            mirror(&mut next.meta_title, &state.title, &value);
            mirror(&mut next.og_title, &state.title, &value);
            mirror(&mut next.twitter_title, &state.title, &value);

            // The canonical URL tracks the title-derived slug until the
            // author pins a custom one.
            let slug = generate_slug(&value);
            let previous_slug = generate_slug(&state.title);
            if !slug.is_empty()
                && (next.canonical_url.is_empty()
                    || (!previous_slug.is_empty() && next.canonical_url.contains(&previous_slug)))
            {
                let base = base_url.trim_end_matches('/');
                next.canonical_url = format!("{base}/blog/{slug}");
            }
            next.title = value;
        }
        SeoSourceChange::Excerpt(value) => {
            mirror(&mut next.meta_description, &state.excerpt, &value);
            mirror(&mut next.og_description, &state.excerpt, &value);
            mirror(&mut next.twitter_description, &state.excerpt, &value);
            next.excerpt = value;
        }
        SeoSourceChange::Thumbnail(value) => {
            mirror(&mut next.og_image, &state.thumbnail, &value);
            mirror(&mut next.twitter_image, &state.thumbnail, &value);
            next.thumbnail = value;
        }
        SeoSourceChange::Tags(value) => {
            if next.meta_keywords.is_empty() || next.meta_keywords == state.tags {
                next.meta_keywords = value.clone();
            }
            next.tags = value;
        }
    }

    next
}
