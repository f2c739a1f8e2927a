//! Cache Store Module
//!
//! HashMap storage bounded by entry count and total bytes, with LRU eviction
//! and TTL expiration.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::cache::{CacheEntry, CacheKey, CacheStats, LruTracker};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Response storage with LRU eviction and TTL support.
///
/// The store is not synchronized on its own; the middleware shares it behind
/// a `tokio::sync::RwLock` and holds the lock only for single operations.
#[derive(Debug)]
pub struct CacheStore {
    /// Key → entry storage
    entries: HashMap<CacheKey, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Maximum accounted bytes allowed
    max_bytes: usize,
    /// Sum of `size` over all stored entries
    total_bytes: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store bounded by `max_entries` and `max_bytes`.
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            max_bytes,
            total_bytes: 0,
        }
    }

    // == Get ==
    /// Returns a live entry for `key`.
    ///
    /// Expired entries are removed on the spot and reported as absent.
    pub fn get(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).cloned()
    }

    // == Put ==
    /// Inserts `entry` under `entry.key`, replacing any previous entry.
    ///
    /// Least recently used entries are evicted until both the entry and byte
    /// bounds admit the new entry. An entry that could never fit is rejected
    /// and the current contents stay untouched.
    pub fn put(&mut self, entry: CacheEntry) -> Result<()> {
        if self.max_entries == 0 || entry.size > self.max_bytes {
            self.stats.record_rejection();
            return Err(CacheError::StoreCapacity(format!(
                "entry of {} bytes does not fit (max_entries={}, max_bytes={})",
                entry.size, self.max_entries, self.max_bytes
            )));
        }

        if let Some(previous) = self.entries.remove(&entry.key) {
            self.lru.remove(&entry.key);
            self.release(previous.size)?;
        }

        while self.entries.len() >= self.max_entries
            || self.total_bytes + entry.size > self.max_bytes
        {
            let Some(victim) = self.lru.evict_oldest() else {
                return Err(self.corrupted(format!(
                    "nothing left to evict with {} entries and {} bytes stored",
                    self.entries.len(),
                    self.total_bytes
                )));
            };

            let Some(evicted) = self.entries.remove(&victim) else {
                return Err(self.corrupted(format!("tracked key {} has no entry", victim)));
            };

            self.release(evicted.size)?;
            self.stats.record_eviction();
            debug!(key = %victim, size = evicted.size, "evicted cache entry");
        }

        self.total_bytes += entry.size;
        self.lru.touch(&entry.key);
        self.entries.insert(entry.key.clone(), entry);
        self.sync_footprint();

        Ok(())
    }

    // == Invalidate ==
    /// Removes one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        let removed = self.remove_entry(key);
        if removed {
            self.stats.record_invalidations(1);
        }
        removed
    }

    /// Removes every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let matching: Vec<CacheKey> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_entry(key);
        }

        self.stats.record_invalidations(matching.len());
        matching.len()
    }

    /// Removes every entry. Returns how many were dropped.
    pub fn invalidate_all(&mut self) -> usize {
        let count = self.entries.len();
        self.clear();
        self.stats.record_invalidations(count);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired.len());
        expired.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_footprint(self.entries.len(), self.total_bytes);
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Internal Bookkeeping ==
    fn remove_entry(&mut self, key: &CacheKey) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };

        self.lru.remove(key);
        // A missing key cannot underflow; a mismatch is caught by the next put.
        self.total_bytes = self.total_bytes.saturating_sub(entry.size);
        self.sync_footprint();
        true
    }

    fn release(&mut self, size: usize) -> Result<()> {
        match self.total_bytes.checked_sub(size) {
            Some(remaining) => {
                self.total_bytes = remaining;
                Ok(())
            }
            None => Err(self.corrupted(format!(
                "releasing {} bytes from a total of {}",
                size, self.total_bytes
            ))),
        }
    }

    /// Wipes the store after a bookkeeping mismatch and builds the error.
    fn corrupted(&mut self, detail: String) -> CacheError {
        error!(detail = %detail, "cache store corrupted, resetting");
        self.clear();
        self.stats.record_reset();
        CacheError::StoreCorruption(detail)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.total_bytes = 0;
        self.sync_footprint();
    }

    fn sync_footprint(&mut self) {
        self.stats.set_footprint(self.entries.len(), self.total_bytes);
    }
}
