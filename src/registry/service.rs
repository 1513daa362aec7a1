use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::analytics::Analytics;
use crate::clock::Clock;
use crate::expiration::{ExpirationIndex, Sweep};
use crate::models::{BulkCreateItem, BulkCreateResult, BulkDeleteResult, Mapping};
use crate::registry::codegen::CodeGenerator;
use crate::registry::validation::{validate_custom_code, validate_url};
use crate::registry::{RegistryError, RegistryResult};
use crate::storage::{ClickOutcome, Storage, StorageError};

/// Attempts at finding a free generated code before giving up
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// The short code registry
///
/// Owns the mapping table through [`Storage`] and keeps the expiration
/// index and analytics in step with it. Each collaborator has its own lock;
/// a create or click touches them one after another, never atomically.
pub struct Registry {
    storage: Arc<dyn Storage>,
    expirations: Arc<ExpirationIndex>,
    analytics: Arc<Analytics>,
    clock: Arc<dyn Clock>,
    generator: CodeGenerator,
}

impl Registry {
    pub fn new(
        storage: Arc<dyn Storage>,
        expirations: Arc<ExpirationIndex>,
        analytics: Arc<Analytics>,
        clock: Arc<dyn Clock>,
        generator: CodeGenerator,
    ) -> Self {
        Self {
            storage,
            expirations,
            analytics,
            clock,
            generator,
        }
    }

    /// Create a mapping for `original_url`, under `custom_code` if given
    pub async fn create(
        &self,
        original_url: &str,
        custom_code: Option<&str>,
        ttl: Option<Duration>,
    ) -> RegistryResult<Mapping> {
        validate_url(original_url)?;
        if let Some(code) = custom_code {
            validate_custom_code(code)?;
        }
        if ttl.is_some_and(|ttl| ttl <= Duration::zero()) {
            return Err(RegistryError::InvalidTtl);
        }

        let now = self.clock.now();
        let expires_at = ttl
            .map(|ttl| now.checked_add_signed(ttl).ok_or(RegistryError::InvalidTtl))
            .transpose()?;
        let template = Mapping {
            short_code: String::new(),
            original_url: original_url.trim().to_string(),
            created_at: now,
            expires_at,
            click_count: 0,
            custom_code: custom_code.map(str::to_string),
        };

        let mapping = match custom_code {
            Some(code) => {
                let mapping = Mapping {
                    short_code: code.to_string(),
                    ..template
                };
                match self.storage.insert(mapping, now).await {
                    Ok(mapping) => mapping,
                    Err(StorageError::Conflict) => {
                        return Err(RegistryError::CodeConflict(code.to_string()))
                    }
                    Err(StorageError::Other(e)) => return Err(RegistryError::Storage(e)),
                }
            }
            None => self.insert_generated(template).await?,
        };

        // An entry left by a replaced expired holder is dropped by the next sweep
        if let Some(expires_at) = mapping.expires_at {
            self.expirations.set_expires_at(&mapping.short_code, expires_at);
        }
        self.analytics.record_creation();

        info!(
            short_code = %mapping.short_code,
            custom = mapping.custom_code.is_some(),
            expires_at = ?mapping.expires_at,
            "created short link"
        );
        Ok(mapping)
    }

    async fn insert_generated(&self, template: Mapping) -> RegistryResult<Mapping> {
        let now = template.created_at;

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let sequence = self.storage.next_sequence();
            let code = self
                .generator
                .derive(sequence)
                .ok_or(RegistryError::CodeSpaceExhausted)?;

            let mapping = Mapping {
                short_code: code,
                ..template.clone()
            };
            match self.storage.insert(mapping, now).await {
                Ok(mapping) => return Ok(mapping),
                Err(StorageError::Conflict) => {
                    debug!(attempt, sequence, "generated code taken, retrying");
                }
                Err(StorageError::Other(e)) => return Err(RegistryError::Storage(e)),
            }
        }

        Err(RegistryError::CodeSpaceExhausted)
    }

    /// Follow a short code: counts a click on success, evicts it if expired
    pub async fn resolve(&self, short_code: &str) -> RegistryResult<Mapping> {
        let now = self.clock.now();

        match self.storage.record_click(short_code, now).await? {
            ClickOutcome::Clicked(mapping) => {
                self.analytics.record_click(short_code);
                Ok(mapping)
            }
            ClickOutcome::Expired(evicted) => {
                self.forget_expiry(&evicted);
                info!(short_code = %short_code, "evicted expired short link on access");
                Err(RegistryError::Expired)
            }
            ClickOutcome::Missing => Err(RegistryError::NotFound),
        }
    }

    /// Look up a mapping without counting a click
    ///
    /// Expiry is enforced exactly as in [`Registry::resolve`]: an expired
    /// mapping reports `Expired` and is evicted.
    pub async fn stats(&self, short_code: &str) -> RegistryResult<Mapping> {
        let now = self.clock.now();
        let mapping = self
            .storage
            .get(short_code)
            .await?
            .ok_or(RegistryError::NotFound)?;

        if mapping.is_live(now) {
            return Ok(mapping);
        }

        let removed = self
            .storage
            .remove_expired(&[short_code.to_string()], now)
            .await?;
        let Some(evicted) = removed.first() else {
            // Replaced by a fresh mapping between the two lock acquisitions
            return self
                .storage
                .get(short_code)
                .await?
                .filter(|m| m.is_live(now))
                .ok_or(RegistryError::NotFound);
        };

        self.forget_expiry(evicted);
        Err(RegistryError::Expired)
    }

    pub async fn delete(&self, short_code: &str) -> RegistryResult<bool> {
        let Some(removed) = self.storage.remove(short_code).await? else {
            return Ok(false);
        };
        self.forget_expiry(&removed);
        info!(short_code = %short_code, "deleted short link");
        Ok(true)
    }

    /// Create each item independently, preserving request order
    pub async fn bulk_create(&self, items: &[BulkCreateItem]) -> Vec<BulkCreateResult> {
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let custom_code = item.custom_code.as_deref().filter(|c| !c.is_empty());
            let result = match self.create(&item.url, custom_code, None).await {
                Ok(mapping) => BulkCreateResult::Created {
                    url: item.url.clone(),
                    short_code: mapping.short_code,
                },
                Err(e) => BulkCreateResult::Failed {
                    url: item.url.clone(),
                    error: e.to_string(),
                },
            };
            results.push(result);
        }

        results
    }

    pub async fn bulk_delete(&self, short_codes: &[String]) -> RegistryResult<BulkDeleteResult> {
        let removed = self.storage.remove_many(short_codes).await?;
        for mapping in &removed.removed {
            self.forget_expiry(mapping);
        }
        let result = BulkDeleteResult {
            deleted: removed.removed.into_iter().map(|m| m.short_code).collect(),
            not_found: removed.not_found,
        };

        info!(
            deleted = result.deleted.len(),
            not_found = result.not_found.len(),
            "bulk delete finished"
        );
        Ok(result)
    }

    /// Remove every mapping whose expiry has passed
    pub async fn sweep_expired(&self) -> RegistryResult<usize> {
        let expired = self.expirations.take_expired();
        if expired.is_empty() {
            return Ok(0);
        }

        let now = self.clock.now();
        let removed = self.storage.remove_expired(&expired, now).await?;

        // A code that survived was reused by a mapping with a later expiry;
        // put its real expiry back so a future sweep still finds it
        if removed.len() < expired.len() {
            let removed_codes: HashSet<&str> =
                removed.iter().map(|m| m.short_code.as_str()).collect();
            for code in expired.iter().filter(|c| !removed_codes.contains(c.as_str())) {
                if let Some(expires_at) = self.storage.get(code).await?.and_then(|m| m.expires_at) {
                    debug!(short_code = %code, "re-indexing expiry of reused code");
                    self.expirations.set_expires_at(code, expires_at);
                }
            }
        }

        Ok(removed.len())
    }

    /// Drop the index entry of an evicted mapping; an entry written since by
    /// a newer mapping under the same code is left alone
    fn forget_expiry(&self, evicted: &Mapping) {
        if let Some(expires_at) = evicted.expires_at {
            self.expirations.remove_if(&evicted.short_code, expires_at);
        }
    }

    pub async fn len(&self) -> RegistryResult<usize> {
        Ok(self.storage.len().await?)
    }

    pub async fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl Sweep for Registry {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn sweep(&self) -> anyhow::Result<usize> {
        Ok(self.sweep_expired().await?)
    }
}
