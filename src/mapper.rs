//! Detector mapper orchestration.
//!
//! Finds matching detectors for each incoming metric:
//! - hot-path cache probes that never touch the network
//! - batched backend lookups on miss, with negative caching for metrics
//!   that match no mapping
//! - an adaptive batch-size heuristic fed by the most recent backend
//!   lookup latency
//! - the reconciliation step that applies disabled/changed mapping rules
//!   to the cache and advances the sync watermark

use crate::cache::DetectorMappingCache;
use crate::cache_key::derive_key;
use crate::source::DetectorSource;
use crate::telemetry::MapperTelemetry;
use crate::types::{now_ms, Detector, DetectorMapping, MetricTags};
use log::{error, info, trace, warn};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Nominal batch size used while the backend has headroom.
pub const OPTIMAL_BATCH_SIZE: usize = 80;

/// Latency sample sentinel: no lookup has completed yet.
const LATENCY_NEVER_MEASURED: i64 = -1;
/// Latency sample sentinel: the last lookup failed.
const LATENCY_LOOKUP_FAILED: i64 = -2;
/// Lookups at or below this latency shrink the batch to zero.
const SLOW_LOOKUP_THRESHOLD_MS: i64 = 10;

/// Orchestrator for detector resolution.
///
/// The cache and the sync watermark are the only shared mutable state;
/// both are safe under concurrent access from stream workers and the
/// background sync task.
pub struct DetectorMapper {
    source: Arc<dyn DetectorSource>,
    cache: Arc<DetectorMappingCache>,
    telemetry: Arc<MapperTelemetry>,
    /// Most recent backend lookup latency in ms, or a sentinel
    last_lookup_latency_ms: AtomicI64,
    /// Instant up to which the cache is known consistent with the backend
    synced_up_till_ms: AtomicU64,
}

impl DetectorMapper {
    /// Creates a mapper wired to a backend source and cache. The sync
    /// watermark starts at construction time.
    pub fn new(
        source: Arc<dyn DetectorSource>,
        cache: Arc<DetectorMappingCache>,
        telemetry: Arc<MapperTelemetry>,
    ) -> Self {
        Self {
            source,
            cache,
            telemetry,
            last_lookup_latency_ms: AtomicI64::new(LATENCY_NEVER_MEASURED),
            synced_up_till_ms: AtomicU64::new(now_ms()),
        }
    }

    pub fn cache(&self) -> &Arc<DetectorMappingCache> {
        &self.cache
    }

    pub fn telemetry(&self) -> &Arc<MapperTelemetry> {
        &self.telemetry
    }

    /// Timestamp up to which the cache is known consistent with the
    /// backend's mapping rules.
    pub fn synced_up_till_ms(&self) -> u64 {
        self.synced_up_till_ms.load(Ordering::Acquire)
    }

    /// Most recent backend lookup latency in ms; negative values are the
    /// never-measured (-1) and lookup-failed (-2) sentinels.
    pub fn last_lookup_latency_ms(&self) -> i64 {
        self.last_lookup_latency_ms.load(Ordering::Relaxed)
    }

    /// Hot-path lookup: derive the key and probe the cache.
    ///
    /// `Some(vec![])` is a confirmed "no detectors apply" result; `None`
    /// means the caller should accumulate this metric into a miss batch.
    pub fn detectors_from_cache(&self, tags: &MetricTags) -> Option<Vec<Detector>> {
        self.cache.get(&derive_key(tags))
    }

    /// Batch size the caller should accumulate before the next lookup.
    ///
    /// Returns the nominal size while no lookup has completed or the
    /// last one ran above the latency threshold; otherwise returns 0 so
    /// the caller drains misses opportunistically.
    pub fn optimal_batch_size(&self) -> usize {
        let latency = self.last_lookup_latency_ms.load(Ordering::Relaxed);
        if latency == LATENCY_NEVER_MEASURED || latency > SLOW_LOOKUP_THRESHOLD_MS {
            return OPTIMAL_BATCH_SIZE;
        }
        0
    }

    /// Resolves a batch of cache-missed tag sets in one backend round
    /// trip.
    ///
    /// On success every batch position is settled: positions with a
    /// non-empty match get their detector list cached, positions absent
    /// from the response get an explicit empty list so they stop missing
    /// on every occurrence. On failure the cache is left untouched and
    /// the latency sample is set to the failure sentinel.
    ///
    /// The return value reflects only whether a backend response was
    /// obtained, independent of how many tag sets matched.
    pub async fn is_successful_lookup(&self, cache_missed_tags: &[MetricTags]) -> bool {
        self.telemetry.record_lookup();

        let response = match self.source.find_detector_mappings(cache_missed_tags).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error fetching detector mappings from backend: {}", e);
                self.telemetry.record_error();
                self.telemetry.record_failed_lookup();
                self.last_lookup_latency_ms
                    .store(LATENCY_LOOKUP_FAILED, Ordering::Relaxed);
                return false;
            }
        };

        self.last_lookup_latency_ms
            .store(response.lookup_time_ms as i64, Ordering::Relaxed);

        for (&index, detectors) in &response.grouped_detectors_by_index {
            match cache_missed_tags.get(index) {
                Some(tags) if !detectors.is_empty() => {
                    self.cache.put(derive_key(tags), detectors.clone());
                }
                Some(_) => {}
                None => warn!(
                    "Match response index {} outside batch of {}",
                    index,
                    cache_missed_tags.len()
                ),
            }
        }

        // Metrics with no matching detectors are cached as empty so they
        // do not trigger a backend lookup on every occurrence.
        for (index, tags) in cache_missed_tags.iter().enumerate() {
            if !response.grouped_detectors_by_index.contains_key(&index) {
                self.cache.put(derive_key(tags), Vec::new());
            }
        }

        true
    }

    /// One reconciliation cycle against the backend rule store.
    ///
    /// Fetches mappings changed since the sync watermark and applies
    /// disabled-removal before stale-invalidation, so a mapping that was
    /// disabled and also appears changed is fully evicted. The watermark
    /// advances to `current_time_ms` only after both steps complete; a
    /// failed fetch returns before the store, leaving the next cycle to
    /// re-cover the same window.
    pub async fn sync_cache(&self, current_time_ms: u64) -> Result<(), String> {
        let synced_up_till = self.synced_up_till_ms.load(Ordering::Acquire);
        let elapsed_seconds = (current_time_ms as i64 - synced_up_till as i64) / 1000;
        if elapsed_seconds <= 0 {
            trace!("Skipping mapping cache sync: window is {}s", elapsed_seconds);
            self.telemetry.record_skipped_sync();
            return Ok(());
        }

        let mappings = self
            .source
            .find_updated_mappings(elapsed_seconds as u64)
            .await
            .map_err(|e| format!("Failed to fetch updated detector mappings: {}", e))?;

        let disabled: Vec<DetectorMapping> =
            mappings.iter().filter(|m| !m.enabled).cloned().collect();
        if !disabled.is_empty() {
            self.cache.remove_disabled_mappings(&disabled);
            info!("Removed {} disabled detector mappings", disabled.len());
        }

        let changed: Vec<DetectorMapping> =
            mappings.iter().filter(|m| m.enabled).cloned().collect();
        if !changed.is_empty() {
            self.cache.invalidate_stale_mappings(&changed);
            info!(
                "Invalidated cache entries for {} changed detector mappings",
                changed.len()
            );
        }

        self.synced_up_till_ms
            .store(current_time_ms, Ordering::Release);
        self.telemetry.record_sync_cycle();
        Ok(())
    }
}
