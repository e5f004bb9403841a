use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

pub mod admin;
pub mod auth;
pub mod booking;
pub mod public;
pub mod uploads;

use auth::ServerState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::openapi::ApiDoc::openapi())
}

/// Build the full application router: public pages and reads, the booking
/// form, and token-protected admin routes.
pub fn build_router(state: ServerState, cors: CorsLayer, frontend_dir: &str) -> Router {
    let static_site = ServeDir::new(frontend_dir)
        .fallback(ServeFile::new(format!("{frontend_dir}/index.html")));
    let upload_files = ServeDir::new(state.uploads.dir());
    let body_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD;

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/booking", post(booking::submit_form))
        .route("/api/bookings", post(booking::submit_json))
        .route("/api/:table", get(public::list))
        .route("/api/:table/:id", get(public::get))
        .nest_service("/uploads", upload_files);

    let admin_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/admin/uploads", post(uploads::upload_file))
        .route("/admin/uploads/gallery", post(uploads::upload_gallery))
        .route("/admin/uploads/videos", post(uploads::upload_video))
        .route("/admin/:table", get(admin::list_records).post(admin::create_record))
        .route(
            "/admin/:table/:id",
            get(admin::get_record).put(admin::update_record).delete(admin::delete_record),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    public_routes
        .merge(admin_routes)
        .fallback_service(static_site)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
