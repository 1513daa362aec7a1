pub mod analytics;
pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod expiration;
pub mod models;
pub mod ratelimit;
pub mod redirect;
pub mod registry;
pub mod state;
pub mod storage;

use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// The full HTTP surface: JSON API plus the redirect endpoint
pub fn create_app(state: Arc<AppState>) -> Router {
    api::create_api_router(Arc::clone(&state))
        .merge(redirect::create_redirect_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
