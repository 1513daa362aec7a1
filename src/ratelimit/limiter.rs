use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::config::MAX_DURATION_SECS;
use crate::expiration::Sweep;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Admitted requests per client inside one window
    pub limit: usize,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            window_secs: 60,
        }
    }
}

/// Sliding window rate limiter keyed by client identity
///
/// Each client keeps the timestamps of its admitted requests. A denied
/// request is not recorded, so hammering a full window does not push the
/// client's reopening further out.
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<DateTime<Utc>>>,
    limit: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            limit: config.limit,
            window: Duration::seconds(config.window_secs.clamp(1, MAX_DURATION_SECS) as i64),
            clock,
        }
    }

    /// Check whether `client_key` may make another request right now
    pub fn allow(&self, client_key: &str) -> bool {
        let now = self.clock.now();
        let cutoff = now - self.window;

        let mut entry = self.windows.entry(client_key.to_string()).or_default();
        let timestamps = entry.value_mut();
        compact(timestamps, cutoff);

        if timestamps.len() >= self.limit {
            debug!(client = %client_key, limit = self.limit, "rate limit exceeded");
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Time until the oldest admitted request leaves the window, if the client
    /// is currently at its limit
    pub fn retry_after(&self, client_key: &str) -> Option<std::time::Duration> {
        let now = self.clock.now();
        let entry = self.windows.get(client_key)?;
        let cutoff = now - self.window;
        let live: Vec<DateTime<Utc>> = entry.iter().copied().filter(|t| *t > cutoff).collect();

        if live.len() < self.limit {
            return None;
        }

        let oldest = *live.first()?;
        (oldest + self.window - now).to_std().ok()
    }

    /// Forget clients whose windows no longer hold any timestamps
    pub fn prune(&self) -> usize {
        let cutoff = self.clock.now() - self.window;
        let before = self.windows.len();
        self.windows.retain(|_, timestamps| {
            compact(timestamps, cutoff);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl Sweep for RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limiter"
    }

    async fn sweep(&self) -> anyhow::Result<usize> {
        Ok(self.prune())
    }
}

fn compact(timestamps: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
    while timestamps.front().is_some_and(|t| *t <= cutoff) {
        timestamps.pop_front();
    }
}
