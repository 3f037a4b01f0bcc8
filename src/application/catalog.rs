//! Public catalog: post listing with search/filter/sort/pagination, post
//! detail with recommendations, and the tag index.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{
    PostFilter, PostListRequest, PostSort, PostsRepo, RepoError, TagCount,
};
use crate::domain::posts::Post;

pub const DEFAULT_PAGE_SIZE: u32 = 8;
pub const MAX_PAGE_SIZE: u32 = 50;
const RECOMMENDATION_LIMIT: u32 = 4;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Query parameters of the public listing, already parsed but not yet
/// clamped.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub posts: Vec<Post>,
    pub total_count: u64,
    pub has_more: bool,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub recommended: Vec<Post>,
}

#[derive(Debug, Clone)]
pub struct HomeContent {
    pub featured: Vec<Post>,
    pub recent: Vec<Post>,
}

#[derive(Clone)]
pub struct CatalogService {
    posts: Arc<dyn PostsRepo>,
}

impl CatalogService {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self { posts }
    }

    /// Windowed listing. Page numbers are 1-based; out-of-range pages come
    /// back empty with the correct total.
    pub async fn list(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let sort = query
            .sort
            .as_deref()
            .map(PostSort::parse)
            .unwrap_or_default();

        let request = PostListRequest {
            filter: PostFilter {
                tag: normalize(query.tag.as_deref()),
                search: normalize(query.search.as_deref()),
                featured: None,
            },
            sort,
            offset: u64::from(page - 1) * u64::from(limit),
            limit,
        };

        let result = self.posts.list_posts(&request).await?;
        let has_more = request.offset + (result.items.len() as u64) < result.total_count;

        Ok(CatalogPage {
            posts: result.items,
            total_count: result.total_count,
            has_more,
            page,
            limit,
        })
    }

    /// Post lookup by slug plus up to four recommendations: posts sharing
    /// the author or a tag come first, latest posts fill the remainder.
    pub async fn detail(&self, slug: &str) -> Result<Option<PostDetail>, CatalogError> {
        let Some(post) = self.posts.find_by_slug(slug).await? else {
            return Ok(None);
        };

        let mut recommended = self
            .posts
            .list_related(post.id, &post.author, &post.tags, RECOMMENDATION_LIMIT)
            .await?;

        if (recommended.len() as u32) < RECOMMENDATION_LIMIT {
            let mut exclude: Vec<i64> = recommended.iter().map(|p| p.id).collect();
            exclude.push(post.id);
            let backfill = self
                .posts
                .list_latest_excluding(&exclude, RECOMMENDATION_LIMIT - recommended.len() as u32)
                .await?;
            recommended.extend(backfill);
        }
        recommended.truncate(RECOMMENDATION_LIMIT as usize);

        Ok(Some(PostDetail { post, recommended }))
    }

    pub async fn home(&self) -> Result<HomeContent, CatalogError> {
        let featured = self
            .posts
            .list_posts(&PostListRequest {
                filter: PostFilter {
                    featured: Some(true),
                    ..PostFilter::default()
                },
                sort: PostSort::Newest,
                offset: 0,
                limit: 4,
            })
            .await?
            .items;

        let recent = self
            .posts
            .list_posts(&PostListRequest {
                filter: PostFilter::default(),
                sort: PostSort::Newest,
                offset: 0,
                limit: DEFAULT_PAGE_SIZE,
            })
            .await?
            .items;

        Ok(HomeContent { featured, recent })
    }

    pub async fn tags(&self) -> Result<Vec<TagCount>, CatalogError> {
        Ok(self.posts.list_tag_counts().await?)
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
