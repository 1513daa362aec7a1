//! Concurrent registry integration tests
//!
//! These tests verify that creation, resolution and rate limiting stay
//! consistent when many tasks hit the same state at once.

mod common;

use axum::http::StatusCode;
use common::{create_test_app, create_test_state, json_request};
use linkcore::config::Config;
use linkcore::ratelimit::RateLimitConfig;
use std::collections::HashSet;
use tower::ServiceExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_custom_code_creation() {
    let (state, _clock) = create_test_state(Config::default());
    let app = create_test_app(state.clone());

    // Spawn multiple concurrent requests for the same custom code
    let mut handles = vec![];
    for i in 0..10 {
        let app_clone = app.clone();
        let handle = tokio::spawn(async move {
            let request = json_request(
                "POST",
                "/api/shorten",
                serde_json::json!({
                    "url": format!("https://example.com/{i}"),
                    "custom_code": "concurrent-test"
                }),
            );
            app_clone.oneshot(request).await.unwrap().status()
        });
        handles.push(handle);
    }

    let mut success_count = 0;
    let mut conflict_count = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => success_count += 1,
            StatusCode::CONFLICT => conflict_count += 1,
            other => panic!("Unexpected status: {other}"),
        }
    }

    assert_eq!(success_count, 1, "Exactly one creation should win");
    assert_eq!(conflict_count, 9);
    assert_eq!(state.registry.len().await.unwrap(), 1);
    assert_eq!(state.analytics.snapshot().total_urls, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generated_codes_are_unique() {
    let (state, _clock) = create_test_state(Config::default());

    let mut handles = vec![];
    for i in 0..50 {
        let registry = state.registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .create(&format!("https://example.com/{i}"), None, None)
                .await
                .unwrap()
                .short_code
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        assert!(codes.insert(handle.await.unwrap()), "Duplicate short code issued");
    }

    assert_eq!(codes.len(), 50);
    assert_eq!(state.registry.len().await.unwrap(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolves_count_every_click() {
    let (state, _clock) = create_test_state(Config::default());
    state
        .registry
        .create("https://example.com", Some("hot-link"), None)
        .await
        .unwrap();

    let mut handles = vec![];
    for _ in 0..20 {
        let registry = state.registry.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                registry.resolve("hot-link").await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mapping = state.registry.stats("hot-link").await.unwrap();
    assert_eq!(mapping.click_count, 200);

    let snapshot = state.analytics.snapshot();
    assert_eq!(snapshot.total_clicks, 200);
    assert_eq!(snapshot.top_urls.get("hot-link"), Some(&200));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_respect_rate_limit() {
    let config = Config {
        rate_limit: RateLimitConfig {
            limit: 5,
            window_secs: 60,
        },
        ..Config::default()
    };
    let (state, _clock) = create_test_state(config);

    let mut handles = vec![];
    for _ in 0..40 {
        let limiter = state.rate_limiter.clone();
        handles.push(tokio::spawn(async move { limiter.allow("shared-client") }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 5, "Exactly the limit should be admitted");
    assert!(state.rate_limiter.retry_after("shared-client").is_some());
}
