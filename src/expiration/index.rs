use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::Clock;

/// Short code → expiry instant, for every mapping created with a TTL
pub struct ExpirationIndex {
    expirations: RwLock<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl ExpirationIndex {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            expirations: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Record that `short_code` expires `duration` from now. Returns `None`,
    /// recording nothing, when the instant is out of range.
    pub fn set_expiration(&self, short_code: &str, duration: Duration) -> Option<DateTime<Utc>> {
        let expires_at = self.clock.now().checked_add_signed(duration)?;
        self.set_expires_at(short_code, expires_at);
        Some(expires_at)
    }

    pub fn set_expires_at(&self, short_code: &str, expires_at: DateTime<Utc>) {
        self.expirations
            .write()
            .insert(short_code.to_string(), expires_at);
    }

    pub fn expires_at(&self, short_code: &str) -> Option<DateTime<Utc>> {
        self.expirations.read().get(short_code).copied()
    }

    /// Codes without a recorded expiry never expire
    pub fn is_expired(&self, short_code: &str) -> bool {
        let now = self.clock.now();
        self.expirations
            .read()
            .get(short_code)
            .is_some_and(|expires_at| now > *expires_at)
    }

    pub fn remove(&self, short_code: &str) {
        self.expirations.write().remove(short_code);
    }

    /// Remove the entry for `short_code` only if it still records `expires_at`
    ///
    /// A mapping evicted from storage must not take down the entry of a
    /// newer mapping that reused its code in the meantime.
    pub fn remove_if(&self, short_code: &str, expires_at: DateTime<Utc>) -> bool {
        let mut expirations = self.expirations.write();
        if expirations.get(short_code) == Some(&expires_at) {
            expirations.remove(short_code);
            return true;
        }
        false
    }

    /// Remove and return every code whose expiry has passed
    pub fn take_expired(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut expirations = self.expirations.write();

        let expired: Vec<String> = expirations
            .iter()
            .filter(|(_, expires_at)| now > **expires_at)
            .map(|(code, _)| code.clone())
            .collect();

        for code in &expired {
            expirations.remove(code);
        }

        expired
    }

    pub fn len(&self) -> usize {
        self.expirations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.expirations.read().is_empty()
    }
}
