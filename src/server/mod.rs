//! HTTP service: the two vendor parse proxies, the two upload endpoints and
//! a headless session API standing in for the grid/table views.

mod error;
mod items;
mod parse;
mod upload;

pub use error::{ApiError, ErrorBody};

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use log::info;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::error::{ExtractError, Result};
use crate::session::{ScanSettings, Session};

/// Header carrying the global key on session endpoints
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let settings = ScanSettings {
            provider: config.default_provider,
            analysis_type: config.default_analysis,
            storage_provider: config.default_storage,
        };
        AppState {
            config: Arc::new(config),
            session: Arc::new(RwLock::new(Session::new(settings))),
        }
    }

    /// Compare a presented key with the configured global key.
    ///
    /// With no global key configured every request is rejected.
    pub fn authorize(&self, presented: Option<&str>) -> Result<()> {
        match (self.config.global_api_key(), presented) {
            (Some(expected), Some(given)) if expected == given => Ok(()),
            _ => Err(ExtractError::Unauthorized),
        }
    }
}

async fn require_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    match state.authorize(presented) {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError(e).into_response(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the router with all routes
pub fn build_router(state: AppState) -> Router {
    // Camera photos routinely exceed axum's 2 MB default
    let upload_limit = DefaultBodyLimit::max(state.config.server.max_upload_bytes);

    let session_routes = Router::new()
        .route("/api/scan", post(items::scan).layer(upload_limit))
        .route("/api/items", get(items::list_items))
        .route(
            "/api/items/:id",
            delete(items::delete_item).put(items::update_item),
        )
        .route("/api/reset", post(items::reset))
        .route("/api/export.csv", get(items::export_csv))
        .route(
            "/api/settings",
            get(items::get_settings).put(items::update_settings),
        )
        .route("/api/prompts", get(items::list_prompts))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    // Parse and upload endpoints carry the key in their own bodies; uploads
    // also accept the header
    Router::new()
        .route("/health", get(health))
        .route("/api/groq-parse", post(parse::groq_parse))
        .route("/api/openai-parse", post(parse::openai_parse))
        .route(
            "/api/s3-upload-minio",
            post(upload::upload_minio).layer(upload_limit),
        )
        .route(
            "/api/s3-upload-aws",
            post(upload::upload_aws).layer(upload_limit),
        )
        .merge(session_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C
pub async fn serve(config: AppConfig) -> Result<()> {
    let addr: SocketAddr = config.server.bind.parse().map_err(|e| {
        ExtractError::BadRequest(format!("Invalid bind address '{}': {}", config.server.bind, e))
    })?;

    if config.global_api_key().is_none() {
        log::warn!("No global API key configured; every API request will be rejected");
    }

    let app = build_router(AppState::new(config));

    let listener = TcpListener::bind(addr).await?;
    info!("menu-extract listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
