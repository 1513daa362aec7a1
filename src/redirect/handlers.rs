use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::registry::RegistryError;
use crate::state::AppState;

/// Redirect to original URL
pub async fn redirect_url(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.registry.resolve(&code).await {
        Ok(mapping) => {
            tracing::debug!(short_code = %code, clicks = mapping.click_count, "redirecting");
            (StatusCode::FOUND, [(header::LOCATION, mapping.original_url)]).into_response()
        }
        Err(RegistryError::NotFound) => (StatusCode::NOT_FOUND, "Short URL not found").into_response(),
        Err(RegistryError::Expired) => (StatusCode::GONE, "Short URL has expired").into_response(),
        Err(e) => {
            tracing::error!(short_code = %code, "Failed to resolve short URL: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Service banner on the root path
pub async fn index() -> impl IntoResponse {
    #[derive(Serialize)]
    struct IndexResponse {
        message: &'static str,
        endpoints: &'static str,
    }

    Json(IndexResponse {
        message: "URL Shortener API",
        endpoints: "POST /api/shorten, POST /api/bulk, GET /{shortCode}, GET /api/stats/{shortCode}, GET /api/analytics",
    })
}
