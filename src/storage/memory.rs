use crate::models::Mapping;
use crate::storage::{ClickOutcome, RemovedMappings, Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Volatile short code table
///
/// A single read-write lock guards the whole table. Lookups share it;
/// anything that mutates a mapping, including a click, takes it exclusively.
pub struct MemoryStorage {
    urls: RwLock<HashMap<String, Mapping>>,
    sequence: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            urls: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn insert(&self, mapping: Mapping, now: DateTime<Utc>) -> StorageResult<Mapping> {
        let mut urls = self.urls.write().await;

        if let Some(existing) = urls.get(&mapping.short_code) {
            if existing.is_live(now) {
                return Err(StorageError::Conflict);
            }
            tracing::debug!(short_code = %mapping.short_code, "replacing expired mapping");
        }

        urls.insert(mapping.short_code.clone(), mapping.clone());
        Ok(mapping)
    }

    async fn get(&self, short_code: &str) -> Result<Option<Mapping>> {
        Ok(self.urls.read().await.get(short_code).cloned())
    }

    async fn record_click(&self, short_code: &str, now: DateTime<Utc>) -> Result<ClickOutcome> {
        let mut urls = self.urls.write().await;

        let Some(mapping) = urls.get_mut(short_code) else {
            return Ok(ClickOutcome::Missing);
        };

        if !mapping.is_live(now) {
            return Ok(urls
                .remove(short_code)
                .map_or(ClickOutcome::Missing, ClickOutcome::Expired));
        }

        mapping.click_count += 1;
        Ok(ClickOutcome::Clicked(mapping.clone()))
    }

    async fn remove(&self, short_code: &str) -> Result<Option<Mapping>> {
        Ok(self.urls.write().await.remove(short_code))
    }

    async fn remove_many(&self, short_codes: &[String]) -> Result<RemovedMappings> {
        let mut urls = self.urls.write().await;
        let mut result = RemovedMappings::default();

        for code in short_codes {
            match urls.remove(code) {
                Some(mapping) => result.removed.push(mapping),
                None => result.not_found.push(code.clone()),
            }
        }

        Ok(result)
    }

    async fn remove_expired(&self, short_codes: &[String], now: DateTime<Utc>) -> Result<Vec<Mapping>> {
        let mut urls = self.urls.write().await;
        let mut removed = Vec::new();

        for code in short_codes {
            if urls.get(code).is_some_and(|mapping| !mapping.is_live(now)) {
                removed.extend(urls.remove(code));
            }
        }

        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.urls.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn mapping(code: &str, expires_at: Option<DateTime<Utc>>) -> Mapping {
        Mapping {
            short_code: code.to_string(),
            original_url: format!("https://example.com/{code}"),
            created_at: Utc::now(),
            expires_at,
            click_count: 0,
            custom_code: None,
        }
    }

    #[tokio::test]
    async fn test_insert_conflicts_with_live_mapping() {
        let storage = MemoryStorage::new();
        let now = Utc::now();

        storage.insert(mapping("abc", None), now).await.unwrap();
        let result = storage.insert(mapping("abc", None), now).await;
        assert!(matches!(result, Err(StorageError::Conflict)));
    }

    #[tokio::test]
    async fn test_insert_replaces_expired_mapping() {
        let storage = MemoryStorage::new();
        let now = Utc::now();

        storage
            .insert(mapping("abc", Some(now - Duration::seconds(1))), now)
            .await
            .unwrap();
        let mut replacement = mapping("abc", None);
        replacement.original_url = "https://example.org".to_string();
        storage.insert(replacement, now).await.unwrap();

        let stored = storage.get("abc").await.unwrap().unwrap();
        assert_eq!(stored.original_url, "https://example.org");
    }

    #[tokio::test]
    async fn test_record_click_outcomes() {
        let storage = MemoryStorage::new();
        let now = Utc::now();

        storage.insert(mapping("live", None), now).await.unwrap();
        storage
            .insert(mapping("old", Some(now + Duration::seconds(5))), now)
            .await
            .unwrap();

        match storage.record_click("live", now).await.unwrap() {
            ClickOutcome::Clicked(m) => assert_eq!(m.click_count, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let later = now + Duration::seconds(6);
        match storage.record_click("old", later).await.unwrap() {
            ClickOutcome::Expired(m) => assert_eq!(m.short_code, "old"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(storage.record_click("old", later).await.unwrap(), ClickOutcome::Missing);
    }

    #[tokio::test]
    async fn test_remove_expired_skips_live_mappings() {
        let storage = MemoryStorage::new();
        let now = Utc::now();

        storage
            .insert(mapping("stale", Some(now - Duration::seconds(1))), now - Duration::seconds(2))
            .await
            .unwrap();
        storage.insert(mapping("fresh", None), now).await.unwrap();

        let removed = storage
            .remove_expired(&["stale".to_string(), "fresh".to_string(), "gone".to_string()], now)
            .await
            .unwrap();

        let codes: Vec<&str> = removed.iter().map(|m| m.short_code.as_str()).collect();
        assert_eq!(codes, vec!["stale"]);
        assert_eq!(storage.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_many_returns_removed_mappings() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let expires_at = Some(now + Duration::days(1));

        storage.insert(mapping("a", expires_at), now).await.unwrap();
        storage.insert(mapping("b", None), now).await.unwrap();

        let result = storage
            .remove_many(&["a".to_string(), "x".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(result.removed.len(), 2);
        assert_eq!(result.removed[0].expires_at, expires_at);
        assert_eq!(result.removed[1].short_code, "b");
        assert_eq!(result.not_found, vec!["x".to_string()]);
        assert_eq!(storage.len().await.unwrap(), 0);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let storage = MemoryStorage::new();
        let first = storage.next_sequence();
        let second = storage.next_sequence();
        assert_eq!(first, 1);
        assert!(second > first);
    }
}
