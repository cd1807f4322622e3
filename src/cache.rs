//! Detector mapping cache with reverse-index invalidation.
//!
//! Maps canonical metric keys to resolved detector lists. An empty list
//! is a valid cached result ("no detectors apply"), distinct from an
//! absent entry. A reverse index from mapping identity to the keys that
//! mapping populated makes rule-driven invalidation targeted instead of
//! a full cache scan.
//!
//! # Thread Safety
//! Primary entries and reverse index live behind one `RwLock`; every
//! mutation updates both under the same write guard, so readers never
//! observe the two structures disagreeing about an entry.
//!
//! # Capacity
//! Unbounded: entries leave only via explicit invalidation or mapping
//! disable, never by size-based eviction.

use crate::types::{Detector, DetectorMapping};
use log::info;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Primary entries and reverse index, mutated only as one unit.
#[derive(Debug, Default)]
struct CacheInner {
    /// Cache key → resolved detectors (possibly empty)
    entries: HashMap<String, Vec<Detector>>,
    /// Mapping identity → keys populated from that mapping
    by_mapping: HashMap<String, HashSet<String>>,
}

impl CacheInner {
    /// Removes one entry and detaches its key from every mapping set
    /// that references it. Returns whether an entry was removed.
    fn evict(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(detectors) => {
                for detector in &detectors {
                    self.detach(&detector.mapping_id, key);
                }
                true
            }
            None => false,
        }
    }

    /// Detaches one key from a mapping's set, dropping the set once it
    /// becomes empty.
    fn detach(&mut self, mapping_id: &str, key: &str) {
        let emptied = match self.by_mapping.get_mut(mapping_id) {
            Some(keys) => {
                keys.remove(key);
                keys.is_empty()
            }
            None => false,
        };
        if emptied {
            self.by_mapping.remove(mapping_id);
        }
    }
}

/// Key → detector-list store with targeted, rule-driven invalidation.
#[derive(Debug, Default)]
pub struct DetectorMappingCache {
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl DetectorMappingCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point lookup.
    ///
    /// `Some(vec![])` is a confirmed "no detectors apply" result;
    /// `None` means the key has never been resolved.
    pub fn get(&self, key: &str) -> Option<Vec<Detector>> {
        let inner = self.inner.read();
        match inner.entries.get(key) {
            Some(detectors) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(detectors.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Returns whether the key has a resolved entry (empty counts).
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    /// Inserts or replaces an entry and indexes every detector's owning
    /// mapping, all under one write guard.
    ///
    /// Replacing an entry first detaches the old detectors' reverse-index
    /// references so no mapping keeps claiming a key it no longer backs.
    pub fn put(&self, key: String, detectors: Vec<Detector>) {
        let mut inner = self.inner.write();
        if let Some(old) = inner.entries.insert(key.clone(), detectors.clone()) {
            for detector in &old {
                inner.detach(&detector.mapping_id, &key);
            }
        }
        for detector in &detectors {
            inner
                .by_mapping
                .entry(detector.mapping_id.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    /// Evicts every entry indexed under each disabled mapping and drops
    /// the mapping's reverse-index set.
    pub fn remove_disabled_mappings(&self, mappings: &[DetectorMapping]) {
        for mapping in mappings.iter().filter(|m| !m.enabled) {
            let evicted = self.evict_mapping(&mapping.id);
            if evicted > 0 {
                info!(
                    "Removed disabled mapping {}: {} cache entries evicted",
                    mapping.id, evicted
                );
            }
        }
    }

    /// Evicts every entry indexed under each changed (enabled) mapping so
    /// the next access re-resolves against the mapping's current
    /// definition. The mapping stays live and is re-indexed by future
    /// puts.
    pub fn invalidate_stale_mappings(&self, mappings: &[DetectorMapping]) {
        for mapping in mappings.iter().filter(|m| m.enabled) {
            let evicted = self.evict_mapping(&mapping.id);
            if evicted > 0 {
                info!(
                    "Invalidated stale mapping {}: {} cache entries evicted",
                    mapping.id, evicted
                );
            }
        }
    }

    /// Keys currently indexed under a mapping identity.
    pub fn indexed_keys(&self, mapping_id: &str) -> Vec<String> {
        self.inner
            .read()
            .by_mapping
            .get(mapping_id)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of resolved entries, negative entries included.
    pub fn entry_count(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Cache activity snapshot.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            entries: inner.entries.len(),
            indexed_mappings: inner.by_mapping.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    // One bounded critical section per mapping: the mapping's key set is
    // detached and its entries removed under a single write guard.
    fn evict_mapping(&self, mapping_id: &str) -> usize {
        let mut inner = self.inner.write();
        let keys = match inner.by_mapping.remove(mapping_id) {
            Some(keys) => keys,
            None => return 0,
        };

        let mut evicted = 0;
        for key in keys {
            if inner.evict(&key) {
                evicted += 1;
            }
        }
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }
}

/// Cache statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of resolved entries (negative entries included)
    pub entries: usize,
    /// Number of mapping identities with at least one indexed key
    pub indexed_mappings: usize,
    /// Point-lookup hits
    pub hits: u64,
    /// Point-lookup misses
    pub misses: u64,
    /// Entries evicted via disable/invalidate
    pub evictions: u64,
}
