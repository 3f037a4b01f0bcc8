//! End-to-end router tests over in-memory repositories.

mod support;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use kalem::application::admin::AdminPostService;
use kalem::application::auth::{AuthService, hash_password};
use kalem::application::catalog::CatalogService;
use kalem::application::repos::{AdminUsersRepo, PostsRepo, PostsWriteRepo};
use kalem::application::sitemap::SitemapService;
use kalem::config::SiteSettings;
use kalem::infra::http::{AppState, build_router};

use support::{InMemoryPosts, SingleAdmin, sample_post};

const PASSWORD: &str = "parola123";

fn build_app(posts: Arc<InMemoryPosts>) -> Router {
    let posts_repo: Arc<dyn PostsRepo> = posts.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = posts;
    let users_repo: Arc<dyn AdminUsersRepo> = Arc::new(SingleAdmin::with_password_hash(
        hash_password(PASSWORD).expect("hash"),
    ));

    let state = AppState {
        catalog: Arc::new(CatalogService::new(posts_repo.clone())),
        admin_posts: Arc::new(AdminPostService::new(posts_repo.clone(), posts_write_repo)),
        auth: Arc::new(AuthService::new(
            users_repo,
            "test-secret",
            time::Duration::hours(1),
        )),
        sitemap: Arc::new(SitemapService::new(posts_repo, "https://blog.example")),
        site: Arc::new(SiteSettings {
            base_url: "https://blog.example".to_string(),
            title: "Kalem".to_string(),
            description: "Test sitesi".to_string(),
        }),
        cookie_secure: false,
    };

    build_router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/admin/auth",
            json!({"username": "editor", "password": PASSWORD}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token").to_string()
}

fn seeded_posts() -> Arc<InMemoryPosts> {
    let mut ankara = sample_post(1, "ankara-notlari", "Ankara Notları");
    ankara.tags = vec!["şehir".to_string(), "gezi".to_string()];
    let mut rust = sample_post(2, "rust-ile-web", "Rust ile Web");
    rust.tags = vec!["rust".to_string()];
    rust.author = "Mehmet".to_string();
    let mut izmir = sample_post(3, "izmir-gunlugu", "İzmir Günlüğü");
    izmir.tags = vec!["şehir".to_string()];
    izmir.featured = true;
    Arc::new(InMemoryPosts::with_posts(vec![ankara, rust, izmir]))
}

#[tokio::test]
async fn list_endpoint_searches_and_paginates() {
    let app = build_app(seeded_posts());

    let (status, body) = send(&app, get("/api/posts?search=rust")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["posts"][0]["slug"], "rust-ile-web");
    assert_eq!(body["hasMore"], false);

    let (_, body) = send(&app, get("/api/posts?limit=2&page=1")).await;
    assert_eq!(body["posts"].as_array().expect("posts").len(), 2);
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["hasMore"], true);

    let (_, body) = send(&app, get("/api/posts?limit=2&page=2")).await;
    assert_eq!(body["posts"].as_array().expect("posts").len(), 1);
    assert_eq!(body["hasMore"], false);

    // Newest first by default.
    let (_, body) = send(&app, get("/api/posts")).await;
    assert_eq!(body["posts"][0]["slug"], "izmir-gunlugu");

    let (_, body) = send(&app, get("/api/posts?sort=oldest")).await;
    assert_eq!(body["posts"][0]["slug"], "ankara-notlari");

    let (_, body) = send(&app, get("/api/posts?tag=%C5%9Fehir")).await;
    assert_eq!(body["totalCount"], 2);
}

#[tokio::test]
async fn detail_endpoint_recommends_other_posts() {
    let app = build_app(seeded_posts());

    let (status, body) = send(&app, get("/api/posts/ankara-notlari")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["slug"], "ankara-notlari");

    let recommended = body["recommended"].as_array().expect("recommended");
    assert!(!recommended.is_empty());
    assert!(recommended.len() <= 4);
    assert!(
        recommended
            .iter()
            .all(|post| post["slug"] != "ankara-notlari")
    );

    let (status, body) = send(&app, get("/api/posts/yok-boyle-bir-yazi")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn tag_endpoint_counts_usage() {
    let app = build_app(seeded_posts());

    let (status, body) = send(&app, get("/api/tags")).await;
    assert_eq!(status, StatusCode::OK);
    let tags = body.as_array().expect("tags");
    assert_eq!(tags[0]["name"], "şehir");
    assert_eq!(tags[0]["count"], 2);
}

#[tokio::test]
async fn admin_surface_requires_a_token() {
    let app = build_app(seeded_posts());

    let (status, body) = send(&app, get("/admin/posts")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/admin/auth",
            json!({"username": "editor", "password": "yanlis"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_an_http_only_cookie() {
    let app = build_app(seeded_posts());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/auth",
            json!({"username": "editor", "password": PASSWORD}),
            None,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie")
        .to_str()
        .expect("ascii");
    assert!(cookie.starts_with("admin-token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn admin_crud_lifecycle() {
    let app = build_app(seeded_posts());
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/admin/posts",
            json!({
                "title": "Şehir ve Çözüm",
                "excerpt": "Kent üzerine",
                "content": "<p>Gövde</p>",
                "author": "Ayşe",
                "tags": ["şehir"]
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "sehir-ve-cozum");
    let id = body["id"].as_i64().expect("id");

    // Same title, same slug: the unique constraint answers with a conflict.
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/admin/posts",
            json!({
                "title": "Şehir ve Çözüm",
                "excerpt": "Başka özet",
                "content": "<p>Gövde</p>",
                "author": "Ayşe"
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/admin/posts/{id}"),
            json!({"title": "Çözümün Şehri"}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "cozumun-sehri");

    let (status, _) = send(
        &app,
        json_request("PUT", &format!("/admin/posts/{id}"), json!({}), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut delete_request = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/posts/{id}"));
    delete_request = delete_request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    let response = app
        .clone()
        .oneshot(delete_request.body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let mut get_request = Request::builder().uri(format!("/admin/posts/{id}"));
    get_request = get_request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    let response = app
        .clone()
        .oneshot(get_request.body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sitemap_is_served_as_xml_with_caching() {
    let app = build_app(seeded_posts());

    let response = app.clone().oneshot(get("/sitemap.xml")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).expect("type"),
        "application/xml"
    );
    assert_eq!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .expect("cache"),
        "public, max-age=3600"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let xml = String::from_utf8(bytes.to_vec()).expect("utf-8");
    assert!(xml.contains("<loc>https://blog.example/blog/ankara-notlari</loc>"));
}

#[tokio::test]
async fn public_pages_render_html() {
    let app = build_app(seeded_posts());

    let response = app.clone().oneshot(get("/blog")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let html = String::from_utf8(bytes.to_vec()).expect("utf-8");
    assert!(html.contains("Ankara Notları"));
    assert!(html.contains("şehir (2)"));

    let response = app
        .clone()
        .oneshot(get("/blog/ankara-notlari"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let html = String::from_utf8(bytes.to_vec()).expect("utf-8");
    assert!(html.contains("<h1>Ankara Notları</h1>"));
    assert!(html.contains("rel=\"canonical\" href=\"https://blog.example/blog/ankara-notlari\""));

    let response = app
        .clone()
        .oneshot(get("/blog/olmayan-yazi"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
