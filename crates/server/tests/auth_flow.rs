use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use server::routes::{self, auth::ServerState};
use service::auth::service::AuthConfig;
use service::file::UploadStore;
use service::storage::MemoryRecordStore;

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

async fn build_app() -> anyhow::Result<Router> {
    let upload_dir = std::env::temp_dir().join(format!("salon_auth_uploads_{}", Uuid::new_v4()));
    let uploads = UploadStore::new(&upload_dir, 1024).await?;
    let state = ServerState::new(MemoryRecordStore::new(), AuthConfig::new("test-secret", 1), uploads, "");
    state.auth.bootstrap_admin("owner", "OwnerPass123").await?;
    Ok(routes::build_router(state, cors(), "tests/no-frontend"))
}

fn login_request(username: &str, password: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json!({"username": username, "password": password}))?))?)
}

#[tokio::test]
async fn test_login_sets_cookie_and_me_reports_admin() -> anyhow::Result<()> {
    let app = build_app().await?;

    let resp = app.clone().oneshot(login_request("owner", "OwnerPass123")?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["admin"]["username"], json!("owner"));
    assert!(body["admin"].get("password_hash").is_none());
    let token = body["token"].as_str().unwrap_or_default();

    let req = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let me: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(me["username"], json!("owner"));
    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.clone().oneshot(login_request("owner", "wrong-password")?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = app.clone().oneshot(login_request("nobody", "OwnerPass123")?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_me_without_token_is_unauthorized() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.clone().oneshot(Request::builder().uri("/auth/me").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())?;
    assert_eq!(app.clone().oneshot(req).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_logout_clears_cookie() -> anyhow::Result<()> {
    let app = build_app().await?;
    let req = Request::builder().method("POST").uri("/auth/logout").body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("auth_token="));
    Ok(())
}
