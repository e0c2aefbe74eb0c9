//! Router configuration for the web server.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;
use crate::proxy::{self, DevProxy};

/// Create the main router with all routes, plus the proxy routes if given.
pub fn create_router(state: AppState, proxy: Option<Arc<DevProxy>>) -> Router {
    let app = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // Report pages
        .route("/reports", get(handlers::list_reports))
        .route("/reports/:hash", get(handlers::report_detail))
        // JSON API
        .route("/api/reports/:hash", get(handlers::api_report))
        // Static assets
        .route("/static/style.css", get(handlers::serve_css))
        .layer(CorsLayer::permissive())
        .with_state(state);

    match proxy {
        Some(proxy) => app.merge(proxy::router(proxy)),
        None => app,
    }
}
