//! HTTP-backed detector source.
//!
//! Talks to the mapping backend's search API over JSON. Lookup latency
//! is measured around the round trip and reported in the match response.

use super::DetectorSource;
use crate::types::{Detector, DetectorMapping, MatchResponse, MetricTags};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Configuration for the HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the mapping backend, e.g. `http://localhost:8000/api/v1`
    pub base_url: String,
    /// Timeout applied to every request
    pub request_timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// `DetectorSource` over the backend's HTTP search API.
#[derive(Debug)]
pub struct HttpDetectorSource {
    client: reqwest::Client,
    config: HttpSourceConfig,
}

impl HttpDetectorSource {
    /// Creates the source. Fails if the HTTP client cannot be built.
    pub fn new(config: HttpSourceConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl DetectorSource for HttpDetectorSource {
    async fn find_detector_mappings(
        &self,
        tag_batch: &[MetricTags],
    ) -> Result<MatchResponse, String> {
        let started = Instant::now();

        let response = self
            .client
            .post(self.url("detector-mappings/find-by-tags"))
            .json(&tag_batch)
            .send()
            .await
            .map_err(|e| format!("Mapping search request failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Mapping search returned error status: {}", e))?;

        let grouped: HashMap<usize, Vec<Detector>> = response
            .json()
            .await
            .map_err(|e| format!("Failed to decode mapping search response: {}", e))?;

        let lookup_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            "Resolved {} tag sets in {}ms ({} matched)",
            tag_batch.len(),
            lookup_time_ms,
            grouped.len()
        );

        Ok(MatchResponse {
            grouped_detectors_by_index: grouped,
            lookup_time_ms,
        })
    }

    async fn find_updated_mappings(
        &self,
        since_seconds: u64,
    ) -> Result<Vec<DetectorMapping>, String> {
        let response = self
            .client
            .get(self.url("detector-mappings/last-updated"))
            .query(&[("time_in_secs", since_seconds)])
            .send()
            .await
            .map_err(|e| format!("Updated-mappings request failed: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Updated-mappings request returned error status: {}", e))?;

        response
            .json()
            .await
            .map_err(|e| format!("Failed to decode updated mappings: {}", e))
    }
}
