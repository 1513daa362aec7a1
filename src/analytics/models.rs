//! Data models for analytics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time copy of all analytics counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// Links created since startup
    pub total_urls: u64,

    /// Successful redirects since startup
    pub total_clicks: u64,

    /// Clicks per short code
    pub top_urls: BTreeMap<String, u64>,

    /// Clicks per local calendar day, keyed `YYYY-MM-DD`
    pub daily_clicks: BTreeMap<String, u64>,
}

/// One row of a most-clicked ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUrl {
    pub short_code: String,
    pub clicks: u64,
}

impl AnalyticsSnapshot {
    /// The `n` most clicked codes, highest first; ties ordered by code
    pub fn top(&self, n: usize) -> Vec<TopUrl> {
        let mut ranked: Vec<TopUrl> = self
            .top_urls
            .iter()
            .map(|(code, clicks)| TopUrl {
                short_code: code.clone(),
                clicks: *clicks,
            })
            .collect();
        ranked.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.short_code.cmp(&b.short_code)));
        ranked.truncate(n);
        ranked
    }
}
