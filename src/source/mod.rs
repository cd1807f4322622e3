//! Backend lookup client interface.
//!
//! The mapping backend resolves batches of tag sets to matching mapping
//! rules and reports which rules changed within a time window. Failures
//! are values: the orchestrator treats any `Err` as "no result this
//! round", never as a reason to unwind the lookup path.

pub mod http;

pub use http::{HttpDetectorSource, HttpSourceConfig};

use crate::types::{DetectorMapping, MatchResponse, MetricTags};
use async_trait::async_trait;

/// Client for the remote mapping-rule search backend.
///
/// Implementations own their timeouts; calls through this trait are the
/// only operations in the crate allowed to block on the network.
#[async_trait]
pub trait DetectorSource: Send + Sync {
    /// Resolves a batch of tag sets to matching detectors, grouped by
    /// the batch index of the tag set they matched.
    async fn find_detector_mappings(
        &self,
        tag_batch: &[MetricTags],
    ) -> Result<MatchResponse, String>;

    /// Returns every mapping changed within the last `since_seconds`.
    async fn find_updated_mappings(
        &self,
        since_seconds: u64,
    ) -> Result<Vec<DetectorMapping>, String>;
}
