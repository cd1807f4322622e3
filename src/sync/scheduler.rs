//! Scheduled cache sync - background task for periodic mapping
//! reconciliation.
//!
//! Runs the mapper's sync cycle on a fixed period, independent of the
//! stream workers driving the lookup path. Cycles never overlap: the
//! loop runs one cycle to completion before waiting for the next tick.
//! A failed cycle is counted and logged, and the sync watermark stays
//! where it was, so the next cycle re-covers the same window.

use crate::mapper::DetectorMapper;
use crate::types::now_ms;
use log::{error, info, trace};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Configuration for the scheduled cache sync.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Minutes between sync cycles (must be at least 1)
    pub sync_period_minutes: u64,
    /// Whether the scheduler is enabled
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_period_minutes: 5,
            enabled: true,
        }
    }
}

/// Scheduler for periodic detector mapping cache sync.
///
/// Spawned as a tokio task during service initialization; holds the
/// mapper by `Arc` alongside however many stream workers share it.
pub struct SyncScheduler {
    mapper: Arc<DetectorMapper>,
    config: SyncConfig,
    /// Timestamp of the last completed cycle attempt
    last_sync_at: RwLock<u64>,
    shutdown: AtomicBool,
}

impl SyncScheduler {
    /// Creates a new scheduler. Fails fast on a zero period: that is a
    /// wiring error, not a runtime condition.
    pub fn new(mapper: Arc<DetectorMapper>, config: SyncConfig) -> Result<Self, String> {
        if config.sync_period_minutes < 1 {
            return Err("Sync period must be at least 1 minute".to_string());
        }
        Ok(Self {
            mapper,
            config,
            last_sync_at: RwLock::new(now_ms()),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Timestamp of the last completed cycle, or construction time if
    /// none has run yet.
    pub fn last_sync_at(&self) -> u64 {
        *self.last_sync_at.read()
    }

    /// Requests cooperative shutdown; the loop exits at its next tick.
    /// An in-flight cycle finishes normally, so the watermark is never
    /// left partially advanced.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Runs the sync loop. Spawn as a tokio task; returns when disabled
    /// or shut down.
    pub async fn start(self: Arc<Self>) {
        if !self.config.enabled {
            info!("Scheduled mapping cache sync is disabled, skipping");
            return;
        }

        info!(
            "Starting scheduled mapping cache sync with {}-minute period",
            self.config.sync_period_minutes
        );

        let mut ticker = interval(Duration::from_secs(self.config.sync_period_minutes * 60));
        // The first tick completes immediately; consume it so the first
        // cycle runs a full period after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if self.shutdown.load(Ordering::Acquire) {
                info!("Mapping cache sync scheduler shut down");
                return;
            }
            self.do_sync().await;
        }
    }

    /// Executes one cycle. Errors are counted and logged, never allowed
    /// to terminate the schedule.
    async fn do_sync(&self) {
        trace!("Updating detector mapping cache");
        match self.mapper.sync_cache(now_ms()).await {
            Ok(()) => {
                *self.last_sync_at.write() = now_ms();
            }
            Err(e) => {
                error!("Error updating detector mapping cache: {}", e);
                self.mapper.telemetry().record_error();
            }
        }
    }
}
