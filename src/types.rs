//! Core data model for detector mapping resolution.
//!
//! Defines the records exchanged with the mapping backend. Mapping rules
//! are owned and mutated by the backend rule store; this crate only
//! observes their identity and enabled state through periodic sync.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Tag set identifying one metric series. Ephemeral, supplied per lookup.
pub type MetricTags = HashMap<String, String>;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One configured anomaly detector instance.
///
/// Immutable once constructed. `mapping_id` names the mapping rule that
/// produced this detector; the cache's reverse index is keyed on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    /// Detector instance identifier
    pub uuid: Uuid,
    /// Identity of the owning mapping rule
    pub mapping_id: String,
    /// Opaque detector parameters (model type, thresholds, ...)
    #[serde(default)]
    pub config: serde_json::Value,
}

impl Detector {
    /// Creates a detector with no parameters.
    pub fn new(uuid: Uuid, mapping_id: impl Into<String>) -> Self {
        Self {
            uuid,
            mapping_id: mapping_id.into(),
            config: serde_json::Value::Null,
        }
    }
}

/// A mapping rule as stored in the backend rule store.
///
/// Created, edited and disabled externally; never mutated here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorMapping {
    /// Rule identity
    pub id: String,
    /// Whether the rule is currently enabled
    pub enabled: bool,
    /// Detector the rule maps matching metrics to
    pub detector: Detector,
    /// Match criteria, evaluated by the backend search engine
    #[serde(default)]
    pub expression: serde_json::Value,
    /// Last modification time (Unix ms), as reported by the backend
    #[serde(default)]
    pub last_modified_ms: u64,
}

/// Result of one batched backend lookup.
///
/// Detector lists are grouped by the batch index of the tag set they
/// matched; an index absent from the map matched no mapping at all.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchResponse {
    /// Batch index → detectors matching that tag set
    pub grouped_detectors_by_index: HashMap<usize, Vec<Detector>>,
    /// Wall-clock latency of the backend call in milliseconds
    pub lookup_time_ms: u64,
}
