//! Wiring of the in-memory services
//!
//! Every service is constructed here and shared by `Arc`; there is no
//! process-wide state, so tests can build as many isolated instances as
//! they like.

use chrono::Duration;
use std::sync::Arc;

use crate::analytics::Analytics;
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::config::{Config, MAX_DURATION_SECS};
use crate::expiration::{spawn_sweeper, ExpirationIndex, Sweep, SweeperHandle};
use crate::models::LinkPreview;
use crate::ratelimit::{ClientKeyPolicy, RateLimiter};
use crate::registry::{CodeGenerator, Registry};
use crate::storage::MemoryStorage;

pub struct AppState {
    pub registry: Arc<Registry>,
    pub analytics: Arc<Analytics>,
    pub expirations: Arc<ExpirationIndex>,
    pub rate_limiter: Arc<RateLimiter>,
    pub preview_cache: Arc<TtlCache<String, LinkPreview>>,
    pub client_key: ClientKeyPolicy,
    pub base_url: String,
    pub preview_ttl: Duration,
    pub sweep_interval: std::time::Duration,
}

impl AppState {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let analytics = Arc::new(Analytics::new(Arc::clone(&clock)));
        let expirations = Arc::new(ExpirationIndex::new(Arc::clone(&clock)));
        let registry = Arc::new(Registry::new(
            Arc::new(MemoryStorage::new()),
            Arc::clone(&expirations),
            Arc::clone(&analytics),
            Arc::clone(&clock),
            CodeGenerator::new(config.short_code_length),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit, Arc::clone(&clock)));
        let preview_cache = Arc::new(TtlCache::new(clock));

        Self {
            registry,
            analytics,
            expirations,
            rate_limiter,
            preview_cache,
            client_key: config.client_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            preview_ttl: Duration::seconds(config.cache.preview_ttl_secs.min(MAX_DURATION_SECS) as i64),
            sweep_interval: std::time::Duration::from_secs(
                config.expiration.sweep_interval_secs.clamp(1, MAX_DURATION_SECS),
            ),
        }
    }

    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }

    /// Everything the background sweeper reclaims
    pub fn sweep_targets(&self) -> Vec<Arc<dyn Sweep>> {
        let registry: Arc<dyn Sweep> = self.registry.clone();
        let rate_limiter: Arc<dyn Sweep> = self.rate_limiter.clone();
        let preview_cache: Arc<dyn Sweep> = self.preview_cache.clone();
        vec![registry, rate_limiter, preview_cache]
    }

    /// Start the sweeper for this state; stop it with [`SweeperHandle::shutdown`]
    pub fn start_sweeper(&self) -> SweeperHandle {
        spawn_sweeper(self.sweep_interval, self.sweep_targets())
    }
}
