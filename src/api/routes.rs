use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

use super::handlers::{
    bulk_delete, bulk_shorten, delete_url, get_analytics, get_stats, health_check, link_preview,
    qr_code, shorten,
};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/shorten", post(shorten))
        .route("/api/bulk", post(bulk_shorten))
        .route("/api/bulk-delete", post(bulk_delete).delete(bulk_delete))
        .route("/api/stats/{code}", get(get_stats))
        .route("/api/urls/{code}", delete(delete_url))
        .route("/api/analytics", get(get_analytics))
        .route("/api/preview", get(link_preview))
        .route("/api/qr", get(qr_code))
        .with_state(state)
}
