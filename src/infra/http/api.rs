//! Read-only JSON API over the public catalog.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::application::catalog::CatalogQuery;
use crate::domain::posts::Post;

use super::AppState;
use super::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{slug}", get(post_by_slug))
        .route("/api/tags", get(list_tags))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
    tag: Option<String>,
    sort: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostListResponse {
    posts: Vec<Post>,
    total_count: u64,
    has_more: bool,
    page: u32,
    limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDetailResponse {
    post: Post,
    recommended: Vec<Post>,
}

#[derive(Debug, Serialize)]
struct TagResponse {
    name: String,
    count: u64,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let page = state
        .catalog
        .list(&CatalogQuery {
            page: query.page,
            limit: query.limit,
            search: query.search,
            tag: query.tag,
            sort: query.sort,
        })
        .await?;

    Ok(Json(PostListResponse {
        posts: page.posts,
        total_count: page.total_count,
        has_more: page.has_more,
        page: page.page,
        limit: page.limit,
    }))
}

async fn post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetailResponse>, ApiError> {
    let detail = state
        .catalog
        .detail(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("No post with that slug"))?;

    Ok(Json(PostDetailResponse {
        post: detail.post,
        recommended: detail.recommended,
    }))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.catalog.tags().await?;
    Ok(Json(
        tags.into_iter()
            .map(|tag| TagResponse {
                name: tag.name,
                count: tag.count,
            })
            .collect(),
    ))
}
