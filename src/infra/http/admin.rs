//! Admin API: login/logout plus the guarded post CRUD surface.
//!
//! The signed token travels in an HTTP-only cookie; an `Authorization:
//! Bearer` header is accepted as a fallback for non-browser clients.

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::application::auth::{AdminIdentity, AuthError};
use crate::domain::posts::{NewPost, Post, PostPatch};

use super::AppState;
use super::error::ApiError;

pub const ADMIN_TOKEN_COOKIE: &str = "admin-token";

pub fn router(state: AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/admin/posts", get(list_posts).post(create_post))
        .route(
            "/admin/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/admin/auth/session", get(session))
        .layer(from_fn_with_state(state, require_admin));

    Router::new()
        .route("/admin/auth", post(login).delete(logout))
        .merge(guarded)
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    username: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    username: String,
}

fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ADMIN_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&jar, request.headers()) else {
        return ApiError::from(AuthError::TokenMissing).into_response();
    };

    match state.auth.verify_token(&token) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let (token, identity) = state.auth.login(&body.username, &body.password).await?;

    let cookie = Cookie::build((ADMIN_TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure)
        .max_age(state.auth.token_ttl())
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            username: identity.username,
        }),
    ))
}

async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = Cookie::build((ADMIN_TOKEN_COOKIE, "")).path("/").build();
    (jar.remove(removal), StatusCode::NO_CONTENT)
}

async fn session(
    axum::Extension(identity): axum::Extension<AdminIdentity>,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        username: identity.username,
    })
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.admin_posts.list().await?))
}

async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.admin_posts.create(body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.admin_posts.get(id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PostPatch>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.admin_posts.update(id, body).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.admin_posts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
