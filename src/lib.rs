//! # Detector Mapper
//!
//! Detector-resolution layer for a streaming anomaly-detection pipeline:
//! determines which anomaly detectors apply to each incoming metric,
//! using mapping rules stored in a remote, slower search backend.
//!
//! # Architecture
//! - Canonical cache keys derived from metric tag sets, order-independent
//! - In-process mapping cache with a reverse index for targeted,
//!   rule-driven invalidation (never a full rebuild on the lookup path)
//! - Batched backend lookups on cache miss, with negative caching for
//!   metrics that match no mapping
//! - Adaptive batch sizing driven by the most recent backend latency
//! - Background sync cycle reconciling disabled/changed mapping rules
//!   against the cache under a monotonic watermark

pub mod cache;
pub mod cache_key;
pub mod mapper;
pub mod source;
pub mod sync;
pub mod telemetry;
pub mod types;

pub use cache::{CacheStats, DetectorMappingCache};
pub use cache_key::derive_key;
pub use mapper::{DetectorMapper, OPTIMAL_BATCH_SIZE};
pub use source::{DetectorSource, HttpDetectorSource, HttpSourceConfig};
pub use sync::{SyncConfig, SyncScheduler};
pub use telemetry::{MapperTelemetry, TelemetrySnapshot};
pub use types::{now_ms, Detector, DetectorMapping, MatchResponse, MetricTags};
