use std::sync::Arc;

use axum::{extract::{rejection::JsonRejection, Request, State}, http::{header, StatusCode}, middleware::Next, response::Response, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use service::auth::{
    domain::{AdminUser, Claims, LoginInput},
    repo::store::StoreAuthRepository,
    service::{AuthConfig, AuthService},
};
use service::booking::BookingService;
use service::file::UploadStore;
use service::storage::RecordStore;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<AuthService<StoreAuthRepository>>,
    pub uploads: Arc<UploadStore>,
    pub bookings: Arc<BookingService>,
}

impl ServerState {
    pub fn new(store: Arc<dyn RecordStore>, auth: AuthConfig, uploads: Arc<UploadStore>, whatsapp_number: &str) -> Self {
        let repo = Arc::new(StoreAuthRepository::new(Arc::clone(&store)));
        Self {
            auth: Arc::new(AuthService::new(repo, auth)),
            bookings: Arc::new(BookingService::new(Arc::clone(&store), whatsapp_number)),
            store,
            uploads,
        }
    }
}

#[derive(Serialize)]
pub struct LoginOutput { pub admin: AdminUser, pub token: String }

#[derive(Serialize)]
pub struct MeOutput { pub admin_id: String, pub username: String, pub expires_at: usize }

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, body: Result<Json<LoginInput>, JsonRejection>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let Json(input) = body?;
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(LoginOutput { admin: session.admin, token: session.token })))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

pub async fn me(Extension(claims): Extension<Claims>) -> Json<MeOutput> {
    Json(MeOutput { admin_id: claims.uid, username: claims.sub, expires_at: claims.exp })
}

/// Token from `Authorization: Bearer <token>`, falling back to the `auth_token` cookie.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h.strip_prefix("Bearer ").map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    }
    let cookie_header = req.headers().get(header::COOKIE).and_then(|v| v.to_str().ok()).unwrap_or("");
    cookie_header
        .split(';')
        .find_map(|part| part.trim().strip_prefix("auth_token="))
        .map(str::to_string)
        .filter(|t| !t.is_empty())
}

/// Middleware for admin routes: a valid token is required; its claims are
/// made available to handlers as an `Extension<Claims>`.
pub async fn require_admin(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = extract_token(&req) else {
        tracing::warn!(path = %path, "missing bearer token and auth_token cookie");
        return Err(JsonApiError::unauthorized());
    };
    match state.auth.verify_token(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            Err(JsonApiError::unauthorized())
        }
    }
}
