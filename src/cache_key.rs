//! Canonical cache-key derivation for metric tag sets.
//!
//! Two tag sets with identical key/value pairs always produce the same
//! key regardless of insertion order; any difference in pairs produces a
//! different key. Pure function, no hidden state.

use crate::types::MetricTags;

/// Derives the canonical cache key for a tag set.
///
/// Pairs are sorted by key and joined as `key=value` with `,` separators.
pub fn derive_key(tags: &MetricTags) -> String {
    let mut pairs: Vec<(&str, &str)> = tags
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    pairs.sort_unstable();

    let mut key = String::with_capacity(tags.len() * 16);
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        key.push_str(k);
        key.push('=');
        key.push_str(v);
    }
    key
}
