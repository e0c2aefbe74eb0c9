//! API endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::super::AppState;
use super::view_status;
use crate::viewer;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Resolved report for a hash, as JSON.
pub async fn api_report(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> impl IntoResponse {
    let view = viewer::resolve(state.source.as_ref(), &state.cache, &hash).await;
    (view_status(&view), Json(view))
}
