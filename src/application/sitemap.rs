//! Sitemap assembly and rendering.
//!
//! Entry building and XML rendering are pure; the service wires them to the
//! posts repository and degrades to the two static entries when the post
//! listing fails, so `/sitemap.xml` never 500s because of the database.

use std::sync::Arc;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::error;

use crate::application::repos::PostsRepo;
use crate::domain::posts::Post;

/// Crawl-frequency hint per the sitemaps.org 0.9 schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: OffsetDateTime,
    pub change_frequency: ChangeFrequency,
    pub priority: f32,
}

/// Build the entry list: home and blog index first, then one entry per post
/// in the order supplied (callers own the ordering; nothing is re-sorted
/// here).
pub fn build_sitemap_entries(
    posts: &[Post],
    base_url: &str,
    now: OffsetDateTime,
) -> Vec<SitemapEntry> {
    let base = base_url.trim_end_matches('/');

    let mut entries = Vec::with_capacity(posts.len() + 2);
    entries.push(SitemapEntry {
        url: base.to_string(),
        last_modified: now,
        change_frequency: ChangeFrequency::Daily,
        priority: 1.0,
    });
    entries.push(SitemapEntry {
        url: format!("{base}/blog"),
        last_modified: now,
        change_frequency: ChangeFrequency::Daily,
        priority: 0.9,
    });

    for post in posts {
        entries.push(SitemapEntry {
            url: format!("{base}/blog/{}", post.slug),
            last_modified: post.publish_date.midnight().assume_utc(),
            change_frequency: ChangeFrequency::Monthly,
            priority: 0.8,
        });
    }

    entries
}

/// Render a sitemaps.org 0.9 `urlset`. Entries are emitted in input order,
/// fields in loc/lastmod/changefreq/priority order; output is
/// byte-deterministic for a fixed entry list.
pub fn render_sitemap_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        let lastmod = entry
            .last_modified
            .format(&Rfc3339)
            .unwrap_or_default();
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", entry.url));
        xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.change_frequency.as_str()
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

#[derive(Clone)]
pub struct SitemapService {
    posts: Arc<dyn PostsRepo>,
    base_url: String,
}

impl SitemapService {
    pub fn new(posts: Arc<dyn PostsRepo>, base_url: impl Into<String>) -> Self {
        Self {
            posts,
            base_url: base_url.into(),
        }
    }

    /// Current entry list. A failing post listing degrades to the static
    /// entries; the error goes to the log only.
    pub async fn entries(&self) -> Vec<SitemapEntry> {
        let now = OffsetDateTime::now_utc();
        match self.posts.list_all_posts().await {
            Ok(posts) => build_sitemap_entries(&posts, &self.base_url, now),
            Err(err) => {
                error!(
                    target = "kalem::sitemap",
                    error = %err,
                    "post listing failed; serving static entries only"
                );
                build_sitemap_entries(&[], &self.base_url, now)
            }
        }
    }

    pub async fn sitemap_xml(&self) -> String {
        render_sitemap_xml(&self.entries().await)
    }

    pub fn robots_txt(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("User-agent: *\nAllow: /\nSitemap: {base}/sitemap.xml\n")
    }
}
