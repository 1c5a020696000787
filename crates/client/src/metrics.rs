//! Client-side counters
//!
//! Lock-free counters recorded on every path through the client. A
//! [`ClientMetricsHandle`] can be taken before shutdown and stays valid
//! after the client shuts down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the reliability layer
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Live points accepted into a buffer
    pub points_enqueued: AtomicU64,

    /// Backfill data accepted into a buffer
    pub backfill_enqueued: AtomicU64,

    /// Batches handed to the transport (first attempts)
    pub batches_submitted: AtomicU64,

    /// Batches acknowledged by the transport
    pub batches_delivered: AtomicU64,

    /// Batches permanently failed (retries exhausted, permanent error,
    /// or undelivered at shutdown)
    pub batches_failed: AtomicU64,

    /// Items in delivered batches
    pub items_delivered: AtomicU64,

    /// Items in permanently failed batches
    pub items_failed: AtomicU64,

    /// Individual retry attempts after transient failures
    pub send_retries: AtomicU64,

    /// Enqueue calls that hit the hard capacity
    pub backpressure_events: AtomicU64,

    /// Metric names accepted by registration
    pub registrations_accepted: AtomicU64,

    /// Metric names rejected by registration (type conflict)
    pub registrations_rejected: AtomicU64,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_point_enqueued(&self) {
        self.points_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backfill_enqueued(&self) {
        self.backfill_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_submitted(&self) {
        self.batches_submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_delivered(&self, items: u64) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.items_delivered.fetch_add(items, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_failed(&self, items: u64) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.items_failed.fetch_add(items, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.send_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_registration(&self, accepted: u64, rejected: u64) {
        self.registrations_accepted
            .fetch_add(accepted, Ordering::Relaxed);
        self.registrations_rejected
            .fetch_add(rejected, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters
    pub fn snapshot(&self) -> ClientMetricsSnapshot {
        ClientMetricsSnapshot {
            points_enqueued: self.points_enqueued.load(Ordering::Relaxed),
            backfill_enqueued: self.backfill_enqueued.load(Ordering::Relaxed),
            batches_submitted: self.batches_submitted.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            items_delivered: self.items_delivered.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
            send_retries: self.send_retries.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            registrations_accepted: self.registrations_accepted.load(Ordering::Relaxed),
            registrations_rejected: self.registrations_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`ClientMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientMetricsSnapshot {
    pub points_enqueued: u64,
    pub backfill_enqueued: u64,
    pub batches_submitted: u64,
    pub batches_delivered: u64,
    pub batches_failed: u64,
    pub items_delivered: u64,
    pub items_failed: u64,
    pub send_retries: u64,
    pub backpressure_events: u64,
    pub registrations_accepted: u64,
    pub registrations_rejected: u64,
}

/// Cloneable handle for reading client counters
///
/// Remains valid after `shutdown()` completes.
#[derive(Debug, Clone)]
pub struct ClientMetricsHandle {
    metrics: Arc<ClientMetrics>,
}

impl ClientMetricsHandle {
    pub(crate) fn new(metrics: Arc<ClientMetrics>) -> Self {
        Self { metrics }
    }

    /// Snapshot the counters
    pub fn snapshot(&self) -> ClientMetricsSnapshot {
        self.metrics.snapshot()
    }
}
