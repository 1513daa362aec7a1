use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::analytics::{AnalyticsSnapshot, TopUrl};
use crate::models::{
    BulkCreateItem, BulkCreateResult, CreateUrlRequest, LinkPreview, Mapping, QrDescriptor,
};
use crate::ratelimit::extract_client_key;
use crate::registry::RegistryError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map registry failures onto HTTP statuses
pub fn registry_error(err: RegistryError) -> ApiError {
    let status = match &err {
        RegistryError::InvalidUrl(_)
        | RegistryError::InvalidCustomCode(_)
        | RegistryError::InvalidTtl => StatusCode::BAD_REQUEST,
        RegistryError::CodeConflict(_) => StatusCode::CONFLICT,
        RegistryError::NotFound => StatusCode::NOT_FOUND,
        RegistryError::Expired => StatusCode::GONE,
        RegistryError::CodeSpaceExhausted => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::Storage(e) => {
            tracing::error!("Registry storage failure: {}", e);
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };
    api_error(status, err.to_string())
}

/// Gate the public creation path; denied requests get 429 with `Retry-After`
fn check_rate_limit(state: &AppState, headers: &HeaderMap, addr: SocketAddr) -> Result<(), Response> {
    let client_key = extract_client_key(headers, addr.ip(), &state.client_key);
    if state.rate_limiter.allow(&client_key) {
        return Ok(());
    }

    tracing::warn!(client = %client_key, "rejected creation request: rate limit exceeded");
    let retry_after = state
        .rate_limiter
        .retry_after(&client_key)
        .map(|d| d.as_secs().max(1))
        .unwrap_or(1);

    Err((
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after.to_string())],
        Json(ErrorResponse {
            error: "Rate limit exceeded. Please try again later.".to_string(),
        }),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Create a new short link
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), Response> {
    check_rate_limit(&state, &headers, addr)?;

    let custom_code = payload.custom_code.as_deref().filter(|c| !c.is_empty());
    let ttl = payload.expires_in_days.map(|days| Duration::days(i64::from(days)));

    let mapping = state
        .registry
        .create(&payload.url, custom_code, ttl)
        .await
        .map_err(|e| registry_error(e).into_response())?;

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            short_url: state.short_url(&mapping.short_code),
            short_code: mapping.short_code,
            original_url: mapping.original_url,
            expires_at: mapping.expires_at,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct BulkShortenRequest {
    pub urls: Vec<BulkCreateItem>,
}

#[derive(Debug, Serialize)]
pub struct BulkShortenEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkShortenResponse {
    pub results: Vec<BulkShortenEntry>,
    pub total: usize,
}

/// Create many short links; each item succeeds or fails on its own
pub async fn bulk_shorten(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<BulkShortenRequest>,
) -> Result<Json<BulkShortenResponse>, Response> {
    check_rate_limit(&state, &headers, addr)?;

    let results: Vec<BulkShortenEntry> = state
        .registry
        .bulk_create(&payload.urls)
        .await
        .into_iter()
        .map(|result| match result {
            BulkCreateResult::Created { url, short_code } => BulkShortenEntry {
                url,
                short_url: Some(state.short_url(&short_code)),
                short_code: Some(short_code),
                error: None,
            },
            BulkCreateResult::Failed { url, error } => BulkShortenEntry {
                url,
                short_code: None,
                short_url: None,
                error: Some(error),
            },
        })
        .collect();

    Ok(Json(BulkShortenResponse {
        total: results.len(),
        results,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub codes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
    pub total: usize,
}

/// Delete many short links at once
pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    let result = state
        .registry
        .bulk_delete(&payload.codes)
        .await
        .map_err(registry_error)?;

    for code in &result.deleted {
        state.preview_cache.delete(code);
    }

    Ok(Json(BulkDeleteResponse {
        total: payload.codes.len(),
        deleted: result.deleted,
        not_found: result.not_found,
    }))
}

/// Get a short link's record without counting a click
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Mapping>, ApiError> {
    state
        .registry
        .stats(&code)
        .await
        .map(Json)
        .map_err(registry_error)
}

/// Delete a short link
pub async fn delete_url(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    match state.registry.delete(&code).await {
        Ok(true) => {
            state.preview_cache.delete(&code);
            Ok(Json(SuccessResponse {
                message: "URL deleted successfully".to_string(),
            }))
        }
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, "URL not found")),
        Err(e) => Err(registry_error(e)),
    }
}

/// Length of the ranked list returned with the analytics snapshot
pub const TOP_URLS_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    #[serde(flatten)]
    pub snapshot: AnalyticsSnapshot,
    /// Most clicked codes, highest first
    pub ranking: Vec<TopUrl>,
}

/// Aggregate usage counters
pub async fn get_analytics(State(state): State<Arc<AppState>>) -> Json<AnalyticsResponse> {
    let snapshot = state.analytics.snapshot();
    Json(AnalyticsResponse {
        ranking: snapshot.top(TOP_URLS_LIMIT),
        snapshot,
    })
}

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    #[serde(default)]
    pub code: Option<String>,
}

fn required_code(query: CodeQuery) -> Result<String, ApiError> {
    query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Code parameter is required"))
}

/// Preview card for a short link, served from the preview cache when warm
pub async fn link_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<LinkPreview>, ApiError> {
    let code = required_code(query)?;

    if let Some(preview) = state.preview_cache.get(&code) {
        return Ok(Json(preview));
    }

    let mapping = state.registry.stats(&code).await.map_err(registry_error)?;
    let preview = LinkPreview::for_url(&mapping.original_url);
    state
        .preview_cache
        .set(code, preview.clone(), state.preview_ttl);

    Ok(Json(preview))
}

/// QR rendering descriptor for a short link
pub async fn qr_code(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<QrDescriptor>, ApiError> {
    let code = required_code(query)?;
    let mapping = state.registry.stats(&code).await.map_err(registry_error)?;

    Ok(Json(QrDescriptor::new(
        &mapping.short_code,
        state.short_url(&mapping.short_code),
        &mapping.original_url,
    )))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub urls: usize,
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let urls = state.registry.len().await.map_err(registry_error)?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        service: "linkcore".to_string(),
        urls,
    }))
}
