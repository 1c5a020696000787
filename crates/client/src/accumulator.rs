//! Batch accumulator - bounded per-token buffering
//!
//! Incoming measurements are buffered per auth token so independent callers
//! never contend on one lock and a batch can never mix tokens. Each
//! partition is a bounded queue with two wakeup paths:
//!
//! - `flush_ready` nudges the token's worker when the buffered count
//!   reaches the batch-size threshold
//! - `capacity_freed` wakes blocked producers after a drain
//!
//! # Backpressure
//!
//! At hard capacity, fail-fast mode returns the buffer-full error without
//! blocking; blocking mode waits until capacity frees or the configured
//! timeout elapses. Nothing is ever silently dropped.
//!
//! # Atomicity
//!
//! `drain` removes items under the same lock `enqueue` appends under, so no
//! item can be both drained and visible to a later enqueue.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use flare_protocol::{AuthToken, Measurement};

use crate::config::{BackpressureMode, ClientConfig};
use crate::error::{IngestError, Result};
use crate::metrics::ClientMetrics;

/// One token's bounded buffer
pub(crate) struct TokenBuffer {
    /// Buffered measurements in enqueue order
    queue: Mutex<VecDeque<Measurement>>,

    /// Signalled when the buffered count reaches the flush threshold
    pub(crate) flush_ready: Notify,

    /// Signalled after a drain frees capacity
    capacity_freed: Notify,
}

impl TokenBuffer {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            flush_ready: Notify::new(),
            capacity_freed: Notify::new(),
        }
    }

    /// Append unless the buffer is at capacity
    ///
    /// Returns the buffered count after the push, or the measurement back
    /// when the buffer is full.
    fn try_push(&self, m: Measurement, capacity: usize) -> std::result::Result<usize, Measurement> {
        let mut queue = self.queue.lock();
        if queue.len() >= capacity {
            return Err(m);
        }
        queue.push_back(m);
        Ok(queue.len())
    }

    /// Atomically remove up to `max` items in insertion order
    pub(crate) fn drain(&self, max: usize) -> Vec<Measurement> {
        let items: Vec<Measurement> = {
            let mut queue = self.queue.lock();
            let n = max.min(queue.len());
            queue.drain(..n).collect()
        };
        if !items.is_empty() {
            self.capacity_freed.notify_waiters();
        }
        items
    }

    /// Current buffered count
    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-token partitioned accumulator
pub(crate) struct Accumulator {
    partitions: DashMap<AuthToken, Arc<TokenBuffer>>,
    batch_size: usize,
    capacity: usize,
    mode: BackpressureMode,
    enqueue_timeout: Duration,
    metrics: Arc<ClientMetrics>,
}

impl Accumulator {
    pub(crate) fn new(config: &ClientConfig, metrics: Arc<ClientMetrics>) -> Self {
        Self {
            partitions: DashMap::new(),
            batch_size: config.batch_size,
            capacity: config.buffer_capacity,
            mode: config.backpressure,
            enqueue_timeout: config.enqueue_timeout,
            metrics,
        }
    }

    /// Get or create the buffer for a token
    pub(crate) fn buffer(&self, token: &AuthToken) -> Arc<TokenBuffer> {
        self.partitions
            .entry(token.clone())
            .or_insert_with(|| Arc::new(TokenBuffer::new()))
            .clone()
    }

    /// Append a measurement to the token's buffer
    ///
    /// Never blocks on network I/O - only on local capacity, and only in
    /// blocking mode. Reaching the batch-size threshold nudges the token's
    /// worker for an immediate flush.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::BufferFull` when the buffer is at capacity
    /// (immediately in fail-fast mode, after `enqueue_timeout` in blocking
    /// mode).
    pub(crate) async fn enqueue(&self, token: &AuthToken, m: Measurement) -> Result<()> {
        let buffer = self.buffer(token);
        let deadline = tokio::time::Instant::now() + self.enqueue_timeout;
        let mut pending = m;
        let mut hit_capacity = false;

        loop {
            // Create the wakeup future before re-checking capacity, so a
            // drain between the check and the await cannot be missed.
            let freed = buffer.capacity_freed.notified();

            match buffer.try_push(pending, self.capacity) {
                Ok(len) => {
                    if len >= self.batch_size {
                        buffer.flush_ready.notify_one();
                    }
                    return Ok(());
                }
                Err(back) => {
                    pending = back;
                    if !hit_capacity {
                        hit_capacity = true;
                        self.metrics.record_backpressure();
                    }

                    match self.mode {
                        BackpressureMode::FailFast => {
                            return Err(IngestError::BufferFull {
                                capacity: self.capacity,
                            });
                        }
                        BackpressureMode::Block => {
                            if tokio::time::timeout_at(deadline, freed).await.is_err() {
                                tracing::debug!(
                                    capacity = self.capacity,
                                    timeout_ms = self.enqueue_timeout.as_millis() as u64,
                                    "blocking enqueue timed out waiting for capacity"
                                );
                                return Err(IngestError::BufferFull {
                                    capacity: self.capacity,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    /// Drain every partition to empty, returning the leftovers per token
    ///
    /// A producer that raced the shutdown check can land an item in a
    /// buffer after its worker drained and exited; this is the catch-all
    /// that makes such stragglers visible.
    pub(crate) fn sweep(&self) -> Vec<(AuthToken, Vec<Measurement>)> {
        self.partitions
            .iter()
            .filter_map(|entry| {
                let items = entry.value().drain(usize::MAX);
                (!items.is_empty()).then(|| (entry.key().clone(), items))
            })
            .collect()
    }

    /// Number of token partitions created so far
    #[cfg(test)]
    pub(crate) fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

#[cfg(test)]
#[path = "accumulator_test.rs"]
mod accumulator_test;
