//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use linkcore::clock::ManualClock;
use linkcore::config::Config;
use linkcore::state::AppState;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

/// Helper to create an isolated state on a manual clock
pub fn create_test_state(config: Config) -> (Arc<AppState>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let state = Arc::new(AppState::new(&config, clock.clone()));
    (state, clock)
}

/// Helper to build the full app with injected connection info
pub fn create_test_app(state: Arc<AppState>) -> Router {
    linkcore::create_app(state).layer(TestConnectInfoLayer::default())
}

pub fn create_test_app_from(state: Arc<AppState>, peer: SocketAddr) -> Router {
    linkcore::create_app(state).layer(TestConnectInfoLayer { peer })
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Helper layer to inject ConnectInfo for tests
#[derive(Clone)]
pub struct TestConnectInfoLayer {
    peer: SocketAddr,
}

impl Default for TestConnectInfoLayer {
    fn default() -> Self {
        Self {
            peer: SocketAddr::from(([127, 0, 0, 1], 12345)),
        }
    }
}

impl<S> Layer<S> for TestConnectInfoLayer {
    type Service = TestConnectInfoMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TestConnectInfoMiddleware {
            inner,
            peer: self.peer,
        }
    }
}

#[derive(Clone)]
pub struct TestConnectInfoMiddleware<S> {
    inner: S,
    peer: SocketAddr,
}

impl<S, B> tower::Service<Request<B>> for TestConnectInfoMiddleware<S>
where
    S: tower::Service<Request<B>> + Clone,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.extensions_mut()
            .insert(axum::extract::connect_info::ConnectInfo(self.peer));
        self.inner.call(req)
    }
}
