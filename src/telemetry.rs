//! Mapper telemetry counters.
//!
//! The error counter is the externally consumed surface (backend lookup
//! and reconciliation failures); the remaining counters feed operational
//! logging and tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe activity counters for the detector mapper.
#[derive(Debug, Default)]
pub struct MapperTelemetry {
    errors: AtomicU64,
    lookups: AtomicU64,
    failed_lookups: AtomicU64,
    sync_cycles: AtomicU64,
    skipped_sync_cycles: AtomicU64,
}

impl MapperTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one backend or reconciliation error.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_lookup(&self) {
        self.failed_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one completed reconciliation cycle.
    pub fn record_sync_cycle(&self) {
        self.sync_cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one cycle skipped on an empty or negative window.
    pub fn record_skipped_sync(&self) {
        self.skipped_sync_cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Counter snapshot.
    pub fn stats(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            errors: self.errors.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            failed_lookups: self.failed_lookups.load(Ordering::Relaxed),
            sync_cycles: self.sync_cycles.load(Ordering::Relaxed),
            skipped_sync_cycles: self.skipped_sync_cycles.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the mapper counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub errors: u64,
    pub lookups: u64,
    pub failed_lookups: u64,
    pub sync_cycles: u64,
    pub skipped_sync_cycles: u64,
}
