//! Submission pipeline - encode, send, retry, report
//!
//! Drained batches are encoded once and sent via the Transport. Transient
//! failures are retried with exponential backoff plus jitter up to the
//! configured attempt limit; permanent failures escalate immediately. A
//! batch is never split across network calls and its retries never
//! interleave with later batches of the same token.
//!
//! # Ordering
//!
//! Each token gets one worker task which drains and submits sequentially,
//! so batches of a token reach the transport in drain order. Workers for
//! different tokens run in parallel.
//!
//! # Failure accounting
//!
//! A permanently failed batch is never silently discarded: it is counted,
//! logged at error level, and published as a [`DeliveryFailure`] for
//! asynchronous retrieval via the client's failure stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use flare_protocol::{AuthToken, Batch, Measurement};

use crate::accumulator::TokenBuffer;
use crate::backoff::Backoff;
use crate::config::RetryConfig;
use crate::error::{IngestError, Result};
use crate::metrics::ClientMetrics;
use crate::transport::{Encoder, Transport};

/// Record of a batch that permanently failed delivery
///
/// The original items are handed back so callers can persist or re-submit
/// them if they choose; the client itself will not retry further.
#[derive(Debug)]
pub struct DeliveryFailure {
    /// Token the batch was accumulated under
    pub token: AuthToken,

    /// The undelivered measurements, still in order
    pub items: Vec<Measurement>,

    /// Delivery attempts made (0 when the batch never reached the wire)
    pub attempts: usize,

    /// Human-readable cause of the failure
    pub reason: String,
}

/// Encode-and-send engine shared by all token workers
pub(crate) struct SubmissionPipeline {
    encoder: Arc<dyn Encoder>,
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
    metrics: Arc<ClientMetrics>,
    failure_tx: mpsc::Sender<DeliveryFailure>,
}

impl SubmissionPipeline {
    pub(crate) fn new(
        encoder: Arc<dyn Encoder>,
        transport: Arc<dyn Transport>,
        retry: RetryConfig,
        metrics: Arc<ClientMetrics>,
        failure_tx: mpsc::Sender<DeliveryFailure>,
    ) -> Self {
        Self {
            encoder,
            transport,
            retry,
            metrics,
            failure_tx,
        }
    }

    /// Deliver one batch, retrying transient failures
    ///
    /// Owns the batch exclusively until it is acknowledged or reported as
    /// permanently failed.
    ///
    /// # Errors
    ///
    /// - `IngestError::Encode` - the encoder rejected the batch (permanent)
    /// - `IngestError::RetriesExhausted` - the transient retry budget ran out
    /// - `IngestError::Transport` - a permanent transport failure
    pub(crate) async fn submit(&self, batch: Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.metrics.record_batch_submitted();

        let payload = match self.encoder.encode(&batch) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    encoder = self.encoder.name(),
                    items = batch.len(),
                    error = %e,
                    "batch could not be encoded, failing permanently"
                );
                let reason = e.to_string();
                self.report_failure(batch, 0, reason);
                return Err(IngestError::Encode(e));
            }
        };

        let max_attempts = self.retry.max_attempts;
        let mut backoff = Backoff::new(&self.retry);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.transport.send_batch(batch.token(), payload.clone()).await {
                Ok(()) => {
                    self.metrics.record_batch_delivered(batch.len() as u64);
                    tracing::debug!(
                        items = batch.len(),
                        backfill = batch.backfill_count(),
                        attempt,
                        "batch delivered"
                    );
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    self.metrics.record_retry();
                    let delay = backoff.next_delay();
                    tracing::debug!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient send failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    tracing::error!(
                        attempts = max_attempts,
                        items = batch.len(),
                        error = %e,
                        "retry budget exhausted, batch permanently failed"
                    );
                    let reason = e.to_string();
                    self.report_failure(batch, max_attempts, reason);
                    return Err(IngestError::RetriesExhausted {
                        attempts: max_attempts,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        attempt,
                        items = batch.len(),
                        error = %e,
                        "permanent transport failure, not retrying"
                    );
                    let reason = e.to_string();
                    self.report_failure(batch, attempt, reason);
                    return Err(IngestError::Transport(e));
                }
            }
        }
    }

    /// Account for a permanently failed batch
    ///
    /// Counted and logged even when the failure channel itself is full, so
    /// nothing disappears unobserved.
    pub(crate) fn report_failure(&self, batch: Batch, attempts: usize, reason: String) {
        self.metrics.record_batch_failed(batch.len() as u64);

        let failure = DeliveryFailure {
            token: batch.token().clone(),
            items: batch.into_items(),
            attempts,
            reason,
        };

        if let Err(e) = self.failure_tx.try_send(failure) {
            tracing::warn!(
                dropped_items = match &e {
                    mpsc::error::TrySendError::Full(f)
                    | mpsc::error::TrySendError::Closed(f) => f.items.len(),
                },
                "delivery-failure channel full or closed, failure record dropped"
            );
        }
    }
}

/// Per-token submission worker
///
/// Wakes on the flush nudge or the flush interval, drains the token's
/// buffer, and submits batch by batch. On cancellation it runs a final
/// drain-and-submit bounded by the shutdown grace period, then reports
/// anything still undelivered as failed.
pub(crate) async fn run_worker(
    token: AuthToken,
    buffer: Arc<TokenBuffer>,
    pipeline: Arc<SubmissionPipeline>,
    batch_size: usize,
    flush_interval: Duration,
    shutdown_grace: Duration,
    cancel: CancellationToken,
) {
    tracing::debug!("submission worker starting");

    loop {
        tokio::select! {
            _ = buffer.flush_ready.notified() => {}
            _ = tokio::time::sleep(flush_interval) => {}
            _ = cancel.cancelled() => break,
        }

        drain_and_submit(&token, &buffer, &pipeline, batch_size).await;
    }

    // Final flush, bounded by the grace period. The deadline gates starting
    // another submit, never an in-flight one: a dispatched send runs to
    // completion (the transport owns its own timeouts), so the remote state
    // is never left ambiguous by a dropped call.
    let deadline = tokio::time::Instant::now() + shutdown_grace;
    loop {
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(
                grace_ms = shutdown_grace.as_millis() as u64,
                "shutdown grace elapsed before final flush completed"
            );
            break;
        }
        let items = buffer.drain(batch_size);
        if items.is_empty() {
            break;
        }
        // Failures are counted, logged, and published by submit itself.
        let _ = pipeline.submit(Batch::new(token.clone(), items)).await;
    }

    let leftover = buffer.drain(usize::MAX);
    if !leftover.is_empty() {
        tracing::error!(
            undelivered = leftover.len(),
            "reporting undelivered items as failed at shutdown"
        );
        pipeline.report_failure(
            Batch::new(token.clone(), leftover),
            0,
            "client shut down before delivery".into(),
        );
    }

    tracing::debug!("submission worker stopped");
}

/// Drain the buffer to empty, one batch at a time
async fn drain_and_submit(
    token: &AuthToken,
    buffer: &TokenBuffer,
    pipeline: &SubmissionPipeline,
    batch_size: usize,
) {
    loop {
        let items = buffer.drain(batch_size);
        if items.is_empty() {
            return;
        }
        // Failures are already counted, logged, and published by submit;
        // the worker moves on to keep later batches flowing.
        let _ = pipeline.submit(Batch::new(token.clone(), items)).await;
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
