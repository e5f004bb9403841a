use std::net::SocketAddr;

use configs::{AppConfig, AuthConfig as AuthSettings, ServerConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};
use service::{
    auth::service::AuthConfig,
    file::{FileRecordStore, UploadStore},
    runtime,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Create the first admin from configuration when the table is empty.
async fn bootstrap_admin(state: &ServerState, auth: &AuthSettings) -> Result<(), StartupError> {
    match (&auth.admin_username, &auth.admin_password) {
        (Some(username), Some(password)) => {
            if let Some(admin) = state.auth.bootstrap_admin(username, password).await? {
                info!(admin_id = %admin.id, username = %admin.username, "bootstrapped first admin");
            }
        }
        _ => warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set; admin bootstrap skipped"),
    }
    Ok(())
}

/// Open the data directory, upload directory and services described by `cfg`.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let storage = &cfg.storage;
    runtime::ensure_env(&storage.frontend_dir, &storage.data_dir, &storage.upload_dir).await?;

    let store = FileRecordStore::open(&storage.data_dir).await?;
    let uploads = UploadStore::new(&storage.upload_dir, storage.max_upload_bytes).await?;
    let state = ServerState::new(
        store,
        AuthConfig::new(&cfg.auth.jwt_secret, cfg.auth.token_ttl_hours),
        uploads,
        &cfg.booking.whatsapp_number,
    );
    bootstrap_admin(&state, &cfg.auth).await?;
    Ok(state)
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = routes::build_router(state, build_cors(), &cfg.storage.frontend_dir);

    let addr = bind_addr(&cfg.server)?;
    info!(%addr, data_dir = %cfg.storage.data_dir, "starting salon server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
