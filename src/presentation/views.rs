use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::macros::format_description;

use crate::application::error::{ErrorReport, HttpError};
use crate::config::SiteSettings;
use crate::domain::posts::Post;
use crate::domain::seo::ResolvedSeo;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(site: &SiteSettings) -> Response {
    let mut response = render_template_response(
        ErrorTemplate {
            site_title: site.title.clone(),
            meta: PageMetaView::site(site, &site.base_url),
            status: 404,
            message: "The page you are looking for does not exist".to_string(),
        },
        StatusCode::NOT_FOUND,
    );
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Everything the `<head>` needs: document metadata plus the Open Graph and
/// Twitter card tags.
#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub canonical: Option<String>,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub twitter_title: String,
    pub twitter_description: String,
    pub twitter_image: String,
}

impl PageMetaView {
    pub fn site(site: &SiteSettings, canonical: &str) -> Self {
        Self {
            title: site.title.clone(),
            description: site.description.clone(),
            keywords: Vec::new(),
            canonical: Some(canonical.to_string()),
            og_title: site.title.clone(),
            og_description: site.description.clone(),
            og_image: String::new(),
            twitter_title: site.title.clone(),
            twitter_description: site.description.clone(),
            twitter_image: String::new(),
        }
    }

    /// Post pages resolve through the SEO fallback table; the canonical URL
    /// defaults to the post's own address when no override is stored.
    pub fn for_post(post: &Post, base_url: &str) -> Self {
        let seo = ResolvedSeo::resolve(post);
        let base = base_url.trim_end_matches('/');
        let canonical = seo
            .canonical_url
            .unwrap_or_else(|| format!("{base}/blog/{}", post.slug));

        Self {
            title: seo.meta_title,
            description: seo.meta_description,
            keywords: seo.meta_keywords,
            canonical: Some(canonical),
            og_title: seo.og_title,
            og_description: seo.og_description,
            og_image: seo.og_image,
            twitter_title: seo.twitter_title,
            twitter_description: seo.twitter_description,
            twitter_image: seo.twitter_image,
        }
    }

    pub fn keywords_joined(&self) -> String {
        self.keywords.join(", ")
    }
}

#[derive(Clone)]
pub struct PostCardView {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub publish_date: String,
    pub read_time: i32,
    pub tags: Vec<String>,
    pub thumbnail: String,
    pub featured: bool,
}

fn format_date(date: time::Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

impl PostCardView {
    pub fn from_post(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            author: post.author.clone(),
            publish_date: format_date(post.publish_date),
            read_time: post.read_time,
            tags: post.tags.clone(),
            thumbnail: post.thumbnail.clone(),
            featured: post.featured,
        }
    }
}

#[derive(Clone)]
pub struct PostView {
    pub title: String,
    pub author: String,
    pub publish_date: String,
    pub read_time: i32,
    pub tags: Vec<String>,
    pub thumbnail: String,
    /// Stored HTML; rendered unescaped.
    pub content: String,
}

impl PostView {
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            author: post.author.clone(),
            publish_date: format_date(post.publish_date),
            read_time: post.read_time,
            tags: post.tags.clone(),
            thumbnail: post.thumbnail.clone(),
            content: post.content.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TagCountView {
    pub name: String,
    pub count: u64,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub site_title: String,
    pub meta: PageMetaView,
    pub featured: Vec<PostCardView>,
    pub recent: Vec<PostCardView>,
}

#[derive(Template)]
#[template(path = "blog.html")]
pub struct BlogTemplate {
    pub site_title: String,
    pub meta: PageMetaView,
    pub posts: Vec<PostCardView>,
    pub tags: Vec<TagCountView>,
    pub page: u32,
    pub has_more: bool,
    pub total_count: u64,
    pub search: String,
    pub active_tag: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub site_title: String,
    pub meta: PageMetaView,
    pub post: PostView,
    pub recommended: Vec<PostCardView>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub site_title: String,
    pub meta: PageMetaView,
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn post() -> Post {
        Post {
            id: 1,
            slug: "deneme".into(),
            title: "Deneme".into(),
            excerpt: "Kısa özet".into(),
            content: "<p>Gövde</p>".into(),
            author: "Ayşe".into(),
            publish_date: date!(2024 - 03 - 09),
            read_time: 4,
            tags: vec!["deneme".into()],
            thumbnail: String::new(),
            featured: false,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
            canonical_url: None,
            og_title: None,
            og_description: None,
            og_image: None,
            twitter_title: None,
            twitter_description: None,
            twitter_image: None,
            created_at: datetime!(2024-03-09 00:00 UTC),
            updated_at: datetime!(2024-03-09 00:00 UTC),
        }
    }

    #[test]
    fn post_meta_defaults_canonical_to_post_url() {
        let meta = PageMetaView::for_post(&post(), "https://blog.example/");
        assert_eq!(
            meta.canonical.as_deref(),
            Some("https://blog.example/blog/deneme")
        );
        assert_eq!(meta.title, "Deneme");
        assert_eq!(meta.keywords_joined(), "deneme");
    }

    #[test]
    fn stored_canonical_override_wins() {
        let mut post = post();
        post.canonical_url = Some("https://elsewhere.example/x".into());
        let meta = PageMetaView::for_post(&post, "https://blog.example");
        assert_eq!(
            meta.canonical.as_deref(),
            Some("https://elsewhere.example/x")
        );
    }

    #[test]
    fn post_template_renders_content_unescaped() {
        let detail = post();
        let html = PostTemplate {
            site_title: "Kalem".into(),
            meta: PageMetaView::for_post(&detail, "https://blog.example"),
            post: PostView::from_post(&detail),
            recommended: vec![],
        }
        .render()
        .expect("render");

        assert!(html.contains("<p>Gövde</p>"));
        assert!(html.contains("https://blog.example/blog/deneme"));
    }
}
