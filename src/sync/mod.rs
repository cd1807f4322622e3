//! Background cache synchronization.
//!
//! Periodically reconciles the mapping cache against rules changed in
//! the backend since the last sync watermark.

pub mod scheduler;

pub use scheduler::{SyncConfig, SyncScheduler};
