//! Unit tests for cache / reverse-index consistency under rule-driven
//! invalidation.
//!
//! Tests verify:
//! - Primary cache and reverse index never disagree about an entry
//! - Negative entries (present-empty) stay distinct from absent keys
//! - Disable eviction vs stale invalidation semantics
//! - Replacement detaches stale reverse-index references

use mapper::cache::DetectorMappingCache;
use mapper::types::{Detector, DetectorMapping};
use uuid::Uuid;

/// Helper to build a detector owned by a mapping.
fn detector(mapping_id: &str) -> Detector {
    Detector::new(Uuid::new_v4(), mapping_id)
}

fn mapping(id: &str, enabled: bool) -> DetectorMapping {
    DetectorMapping {
        id: id.to_string(),
        enabled,
        detector: detector(id),
        expression: serde_json::Value::Null,
        last_modified_ms: 0,
    }
}

// ============================================================================
// BASIC ENTRY SEMANTICS
// ============================================================================

#[test]
fn test_absent_vs_present_empty_vs_present_nonempty() {
    let cache = DetectorMappingCache::new();

    // Absent: never resolved.
    assert_eq!(cache.get("k-absent"), None);

    // Present-empty: a confirmed "no detectors apply" result.
    cache.put("k-empty".to_string(), Vec::new());
    assert_eq!(cache.get("k-empty"), Some(Vec::new()));

    // Present-nonempty.
    let d = detector("m-1");
    cache.put("k-full".to_string(), vec![d.clone()]);
    assert_eq!(cache.get("k-full"), Some(vec![d]));

    assert_eq!(cache.entry_count(), 2);
}

#[test]
fn test_put_indexes_every_owning_mapping() {
    let cache = DetectorMappingCache::new();

    cache.put(
        "k-1".to_string(),
        vec![detector("m-a"), detector("m-b")],
    );

    assert_eq!(cache.indexed_keys("m-a"), vec!["k-1".to_string()]);
    assert_eq!(cache.indexed_keys("m-b"), vec!["k-1".to_string()]);
}

#[test]
fn test_negative_entry_has_no_reverse_index_footprint() {
    let cache = DetectorMappingCache::new();

    cache.put("k-neg".to_string(), Vec::new());

    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.indexed_mappings, 0);
}

// ============================================================================
// DISABLE VS INVALIDATE
// ============================================================================

#[test]
fn test_disable_removes_mapping_and_its_entries() {
    let cache = DetectorMappingCache::new();
    for i in 0..4 {
        cache.put(format!("k-{}", i), vec![detector("m-1")]);
    }
    cache.put("k-other".to_string(), vec![detector("m-2")]);

    cache.remove_disabled_mappings(&[mapping("m-1", false)]);

    for i in 0..4 {
        assert_eq!(cache.get(&format!("k-{}", i)), None);
    }
    assert!(cache.indexed_keys("m-1").is_empty());
    assert!(cache.get("k-other").is_some());
    assert_eq!(cache.stats().evictions, 4);
}

#[test]
fn test_invalidate_forces_fresh_resolution() {
    let cache = DetectorMappingCache::new();
    cache.put("k-1".to_string(), vec![detector("m-1")]);

    cache.invalidate_stale_mappings(&[mapping("m-1", true)]);

    // Entry gone: the next access is a miss and re-resolves.
    assert_eq!(cache.get("k-1"), None);

    // The mapping is not gone; a re-resolution re-indexes it.
    cache.put("k-1".to_string(), vec![detector("m-1")]);
    assert_eq!(cache.indexed_keys("m-1"), vec!["k-1".to_string()]);
}

#[test]
fn test_unknown_mapping_eviction_is_a_noop() {
    let cache = DetectorMappingCache::new();
    cache.put("k-1".to_string(), vec![detector("m-1")]);

    cache.remove_disabled_mappings(&[mapping("m-unknown", false)]);
    cache.invalidate_stale_mappings(&[mapping("m-unknown", true)]);

    assert!(cache.get("k-1").is_some());
    assert_eq!(cache.stats().evictions, 0);
}

// ============================================================================
// SHARED ENTRIES
// ============================================================================

#[test]
fn test_entry_shared_by_two_mappings_fully_detached_on_disable() {
    let cache = DetectorMappingCache::new();
    cache.put(
        "k-shared".to_string(),
        vec![detector("m-1"), detector("m-2")],
    );
    cache.put("k-solo".to_string(), vec![detector("m-2")]);

    cache.remove_disabled_mappings(&[mapping("m-1", false)]);

    // The shared entry is evicted outright, and m-2 only claims the key
    // it still backs.
    assert_eq!(cache.get("k-shared"), None);
    assert_eq!(cache.indexed_keys("m-2"), vec!["k-solo".to_string()]);
}

#[test]
fn test_replacement_moves_key_between_mappings() {
    let cache = DetectorMappingCache::new();
    cache.put("k-1".to_string(), vec![detector("m-old")]);

    // The backend re-resolves the metric under a different rule.
    cache.put("k-1".to_string(), vec![detector("m-new")]);

    assert!(cache.indexed_keys("m-old").is_empty());
    assert_eq!(cache.indexed_keys("m-new"), vec!["k-1".to_string()]);

    // Disabling the stale rule must not evict the rewritten entry.
    cache.remove_disabled_mappings(&[mapping("m-old", false)]);
    assert!(cache.get("k-1").is_some());
}
