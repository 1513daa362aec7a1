use chrono::Local;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analytics::models::AnalyticsSnapshot;
use crate::clock::Clock;

/// Date format for the per-day click table
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Default)]
struct Counters {
    total_urls: u64,
    total_clicks: u64,
    per_code: BTreeMap<String, u64>,
    per_day: BTreeMap<String, u64>,
}

/// Aggregate creation and click counters
///
/// Every update happens under one exclusive lock so a snapshot never sees a
/// click counted in `total_clicks` but missing from the per-code table.
pub struct Analytics {
    counters: RwLock<Counters>,
    clock: Arc<dyn Clock>,
}

impl Analytics {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
            clock,
        }
    }

    pub fn record_creation(&self) {
        self.counters.write().total_urls += 1;
    }

    /// Count a redirect for `short_code` against today's local date
    pub fn record_click(&self, short_code: &str) {
        let day = self
            .clock
            .now()
            .with_timezone(&Local)
            .format(DAY_KEY_FORMAT)
            .to_string();

        let mut counters = self.counters.write();
        counters.total_clicks += 1;
        *counters.per_code.entry(short_code.to_string()).or_insert(0) += 1;
        *counters.per_day.entry(day).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let counters = self.counters.read();
        AnalyticsSnapshot {
            total_urls: counters.total_urls,
            total_clicks: counters.total_clicks,
            top_urls: counters.per_code.clone(),
            daily_clicks: counters.per_day.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn day_key(clock: &ManualClock) -> String {
        clock
            .now()
            .with_timezone(&Local)
            .format(DAY_KEY_FORMAT)
            .to_string()
    }

    #[test]
    fn test_creations_and_clicks_are_tallied() {
        let clock = Arc::new(ManualClock::default());
        let analytics = Analytics::new(clock.clone());

        for _ in 0..3 {
            analytics.record_creation();
        }
        for _ in 0..2 {
            analytics.record_click("x");
        }
        for _ in 0..3 {
            analytics.record_click("y");
        }

        let snapshot = analytics.snapshot();
        assert_eq!(snapshot.total_urls, 3);
        assert_eq!(snapshot.total_clicks, 5);
        assert_eq!(snapshot.top_urls.get("x"), Some(&2));
        assert_eq!(snapshot.top_urls.get("y"), Some(&3));
        assert_eq!(snapshot.daily_clicks.get(&day_key(&clock)), Some(&5));
    }

    #[test]
    fn test_clicks_bucket_by_day_of_click() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()));
        let analytics = Analytics::new(clock.clone());

        analytics.record_click("x");
        let first_day = day_key(&clock);
        clock.advance(Duration::days(1));
        analytics.record_click("x");
        analytics.record_click("x");
        let second_day = day_key(&clock);

        let snapshot = analytics.snapshot();
        assert_ne!(first_day, second_day);
        assert_eq!(snapshot.daily_clicks.get(&first_day), Some(&1));
        assert_eq!(snapshot.daily_clicks.get(&second_day), Some(&2));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let analytics = Analytics::new(Arc::new(ManualClock::default()));
        analytics.record_click("x");

        let snapshot = analytics.snapshot();
        analytics.record_click("x");

        assert_eq!(snapshot.total_clicks, 1);
        assert_eq!(analytics.snapshot().total_clicks, 2);
    }

    #[test]
    fn test_top_orders_by_clicks() {
        let analytics = Analytics::new(Arc::new(ManualClock::default()));
        for (code, n) in [("a", 1), ("b", 3), ("c", 3), ("d", 2)] {
            for _ in 0..n {
                analytics.record_click(code);
            }
        }

        let top: Vec<String> = analytics
            .snapshot()
            .top(3)
            .into_iter()
            .map(|t| t.short_code)
            .collect();
        assert_eq!(top, vec!["b", "c", "d"]);
    }
}
