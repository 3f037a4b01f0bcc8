//! HTTP surface: public HTML pages, the read-only JSON API and the admin API.

pub mod admin;
pub mod api;
pub mod error;
pub mod middleware;
pub mod public;

use std::sync::Arc;

use axum::{Router, middleware::from_fn};

use crate::application::admin::AdminPostService;
use crate::application::auth::AuthService;
use crate::application::catalog::CatalogService;
use crate::application::sitemap::SitemapService;
use crate::config::SiteSettings;

use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub admin_posts: Arc<AdminPostService>,
    pub auth: Arc<AuthService>,
    pub sitemap: Arc<SitemapService>,
    pub site: Arc<SiteSettings>,
    pub cookie_secure: bool,
}

pub fn build_router(state: AppState) -> Router {
    public::router()
        .merge(api::router())
        .merge(admin::router(state.clone()))
        .with_state(state)
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
}
