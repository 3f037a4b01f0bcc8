//! Public, unauthenticated HTML pages plus the crawler endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::application::catalog::{CatalogError, CatalogQuery};
use crate::application::error::ErrorReport;
use crate::presentation::views::{
    BlogTemplate, ErrorTemplate, IndexTemplate, PageMetaView, PostCardView, PostTemplate,
    PostView, TagCountView, render_not_found_response, render_template_response,
};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(post_detail))
        .route("/sitemap.xml", get(sitemap_xml))
        .route("/robots.txt", get(robots_txt))
        .fallback(not_found)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BlogQuery {
    page: Option<u32>,
    limit: Option<u32>,
    search: Option<String>,
    tag: Option<String>,
    sort: Option<String>,
}

impl From<BlogQuery> for CatalogQuery {
    fn from(query: BlogQuery) -> Self {
        CatalogQuery {
            page: query.page,
            limit: query.limit,
            search: query.search,
            tag: query.tag,
            sort: query.sort,
        }
    }
}

async fn index(State(state): State<AppState>) -> Response {
    match state.catalog.home().await {
        Ok(content) => {
            let meta = PageMetaView::site(&state.site, &state.site.base_url);
            render_template_response(
                IndexTemplate {
                    site_title: state.site.title.clone(),
                    meta,
                    featured: content.featured.iter().map(PostCardView::from_post).collect(),
                    recent: content.recent.iter().map(PostCardView::from_post).collect(),
                },
                StatusCode::OK,
            )
        }
        Err(err) => catalog_error_response(&state, err),
    }
}

async fn blog_index(State(state): State<AppState>, Query(query): Query<BlogQuery>) -> Response {
    let search = query.search.clone().unwrap_or_default();
    let active_tag = query.tag.clone().unwrap_or_default();
    let catalog_query = CatalogQuery::from(query);

    let page = match state.catalog.list(&catalog_query).await {
        Ok(page) => page,
        Err(err) => return catalog_error_response(&state, err),
    };
    let tags = match state.catalog.tags().await {
        Ok(tags) => tags,
        Err(err) => return catalog_error_response(&state, err),
    };

    let meta = PageMetaView::site(&state.site, &format!("{}/blog", state.site.base_url));
    render_template_response(
        BlogTemplate {
            site_title: state.site.title.clone(),
            meta,
            posts: page.posts.iter().map(PostCardView::from_post).collect(),
            tags: tags
                .into_iter()
                .map(|tag| TagCountView {
                    name: tag.name,
                    count: tag.count,
                })
                .collect(),
            page: page.page,
            has_more: page.has_more,
            total_count: page.total_count,
            search,
            active_tag,
        },
        StatusCode::OK,
    )
}

async fn post_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match state.catalog.detail(&slug).await {
        Ok(Some(detail)) => {
            let meta = PageMetaView::for_post(&detail.post, &state.site.base_url);
            render_template_response(
                PostTemplate {
                    site_title: state.site.title.clone(),
                    meta,
                    post: PostView::from_post(&detail.post),
                    recommended: detail
                        .recommended
                        .iter()
                        .map(PostCardView::from_post)
                        .collect(),
                },
                StatusCode::OK,
            )
        }
        Ok(None) => render_not_found_response(&state.site),
        Err(err) => catalog_error_response(&state, err),
    }
}

async fn sitemap_xml(State(state): State<AppState>) -> Response {
    let xml = state.sitemap.sitemap_xml().await;
    (
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/xml")),
            (
                CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=3600"),
            ),
        ],
        xml,
    )
        .into_response()
}

async fn robots_txt(State(state): State<AppState>) -> Response {
    (
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
        state.sitemap.robots_txt(),
    )
        .into_response()
}

async fn not_found(State(state): State<AppState>) -> Response {
    render_not_found_response(&state.site)
}

fn catalog_error_response(state: &AppState, err: CatalogError) -> Response {
    let CatalogError::Repo(repo) = &err;
    let status = crate::application::error::AppError::status_for_repo(repo);
    let mut response = render_template_response(
        ErrorTemplate {
            site_title: state.site.title.clone(),
            meta: PageMetaView::site(&state.site, &state.site.base_url),
            status: status.as_u16(),
            message: "Something went wrong while loading posts".to_string(),
        },
        status,
    );
    ErrorReport::from_error("infra::http::public", status, &err).attach(&mut response);
    response
}
