use crate::models::Mapping;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Mappings taken out by a bulk removal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedMappings {
    pub removed: Vec<Mapping>,
    pub not_found: Vec<String>,
}

/// Result of a click attempt against the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The mapping was live; carries the mapping after the increment
    Clicked(Mapping),
    /// The mapping had expired and has been removed; carries the evicted mapping
    Expired(Mapping),
    Missing,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Next value of the code generation counter; never repeats
    fn next_sequence(&self) -> u64;

    /// Insert a mapping unless a live mapping already owns its short code.
    /// An expired holder of the code is replaced.
    async fn insert(&self, mapping: Mapping, now: DateTime<Utc>) -> StorageResult<Mapping>;

    /// Get a mapping by short code, live or not
    async fn get(&self, short_code: &str) -> Result<Option<Mapping>>;

    /// Increment the click count of a live mapping, evicting it if expired
    async fn record_click(&self, short_code: &str, now: DateTime<Utc>) -> Result<ClickOutcome>;

    /// Remove a mapping, returning it if it existed
    async fn remove(&self, short_code: &str) -> Result<Option<Mapping>>;

    /// Remove several mappings in one critical section
    async fn remove_many(&self, short_codes: &[String]) -> Result<RemovedMappings>;

    /// Remove those of `short_codes` that are expired at `now`, returning the
    /// mappings actually removed. Live mappings are left alone even when listed.
    async fn remove_expired(&self, short_codes: &[String], now: DateTime<Utc>) -> Result<Vec<Mapping>>;

    /// Number of stored mappings
    async fn len(&self) -> Result<usize>;
}
