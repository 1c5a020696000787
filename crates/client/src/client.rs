//! Client facade - the three-operation ingestion contract
//!
//! `MetricsClient` wires the accumulator, submission pipeline, and
//! registration coordinator together behind the public contract:
//!
//! - [`add_data_points`](MetricsClient::add_data_points) - live submission
//! - [`backfill_data_points`](MetricsClient::backfill_data_points) -
//!   historical submission
//! - [`register_metrics`](MetricsClient::register_metrics) - metric-type
//!   registration (unbatched)
//!
//! Data operations are local-enqueue-synchronous and network-asynchronous:
//! they return once the measurements are safely buffered, and delivery
//! happens on per-token background workers. Delivery failures are observable
//! through [`failure_stream`](MetricsClient::failure_stream) and the metrics
//! handle.
//!
//! # Example
//!
//! ```ignore
//! let client = MetricsClient::new(ClientConfig::default(), encoder, transport)?;
//!
//! let point = DataPoint::builder("cpu.load")
//!     .value(0.42)
//!     .dimension("host", "web-01")
//!     .build()?;
//! client.add_data_points(&AuthToken::from("tok1"), vec![point]).await?;
//!
//! // ... later
//! client.shutdown().await;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use flare_protocol::{
    AuthToken, Batch, DataPoint, HistoricalDatum, Measurement, MetricType, Value,
};

use crate::accumulator::Accumulator;
use crate::config::{ClientConfig, ConfigError};
use crate::error::{IngestError, Result};
use crate::metrics::{ClientMetrics, ClientMetricsHandle};
use crate::pipeline::{run_worker, DeliveryFailure, SubmissionPipeline};
use crate::registration::RegistrationCoordinator;
use crate::transport::{Encoder, Transport};

/// Reliable metrics-ingestion client
///
/// Safe for concurrent use by multiple logical callers; the auth token is
/// passed per call and never stored. Must be created inside a Tokio runtime
/// because submission workers are spawned lazily per token.
pub struct MetricsClient {
    config: ClientConfig,
    accumulator: Arc<Accumulator>,
    pipeline: Arc<SubmissionPipeline>,
    registration: RegistrationCoordinator,

    /// One submission worker per token seen so far
    workers: DashMap<AuthToken, JoinHandle<()>>,

    /// Cancels all workers at shutdown
    cancel: CancellationToken,

    metrics: Arc<ClientMetrics>,

    /// Receiver of permanently failed batches, takeable once
    failure_rx: Mutex<Option<mpsc::Receiver<DeliveryFailure>>>,
}

impl MetricsClient {
    /// Create a client over the given encoder and transport
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is contradictory.
    pub fn new(
        config: ClientConfig,
        encoder: Arc<dyn Encoder>,
        transport: Arc<dyn Transport>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let metrics = Arc::new(ClientMetrics::new());
        let (failure_tx, failure_rx) = mpsc::channel(config.failure_queue_size);

        tracing::info!(
            batch_size = config.batch_size,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            buffer_capacity = config.buffer_capacity,
            backpressure = ?config.backpressure,
            max_attempts = config.retry.max_attempts,
            encoder = encoder.name(),
            transport = transport.name(),
            "metrics client created"
        );

        let accumulator = Arc::new(Accumulator::new(&config, Arc::clone(&metrics)));
        let pipeline = Arc::new(SubmissionPipeline::new(
            encoder,
            Arc::clone(&transport),
            config.retry.clone(),
            Arc::clone(&metrics),
            failure_tx,
        ));
        let registration =
            RegistrationCoordinator::new(transport, config.retry.clone(), Arc::clone(&metrics));

        Ok(Self {
            config,
            accumulator,
            pipeline,
            registration,
            workers: DashMap::new(),
            cancel: CancellationToken::new(),
            metrics,
            failure_rx: Mutex::new(Some(failure_rx)),
        })
    }

    /// Submit live data points
    ///
    /// Points are buffered in order under the token and delivered
    /// asynchronously. Returns once local enqueue succeeds; reaching the
    /// batch-size threshold triggers an immediate flush.
    ///
    /// # Errors
    ///
    /// - `IngestError::BufferFull` - backpressure (per the configured mode)
    /// - `IngestError::ShuttingDown` - the client has been shut down
    pub async fn add_data_points(
        &self,
        token: &AuthToken,
        points: Vec<DataPoint>,
    ) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(IngestError::ShuttingDown);
        }
        if points.is_empty() {
            return Ok(());
        }

        self.ensure_worker(token);

        for point in points {
            self.accumulator
                .enqueue(token, Measurement::Live(point))
                .await?;
            self.metrics.record_point_enqueued();
        }
        Ok(())
    }

    /// Submit historical data for one (source, metric) series
    ///
    /// Each `(value, timestamp)` pair becomes a [`HistoricalDatum`]; all
    /// pairs are validated before anything is enqueued, so a validation
    /// error leaves the buffer untouched. An empty `data` slice is a no-op
    /// with no network call.
    ///
    /// # Errors
    ///
    /// - `IngestError::Validation` - empty source/metric, non-finite value,
    ///   or a timestamp beyond the skew tolerance
    /// - `IngestError::BufferFull` / `IngestError::ShuttingDown` - as above
    pub async fn backfill_data_points(
        &self,
        token: &AuthToken,
        source: &str,
        metric: &str,
        data: &[(Value, u64)],
    ) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(IngestError::ShuttingDown);
        }
        if data.is_empty() {
            return Ok(());
        }

        let mut items = Vec::with_capacity(data.len());
        for &(value, timestamp_ms) in data {
            let datum = HistoricalDatum::with_skew(
                source,
                metric,
                value,
                timestamp_ms,
                self.config.max_future_skew,
            )?;
            items.push(Measurement::Backfill(datum));
        }

        self.ensure_worker(token);

        for item in items {
            self.accumulator.enqueue(token, item).await?;
            self.metrics.record_backfill_enqueued();
        }
        Ok(())
    }

    /// Register metric types, returning one boolean per requested name
    ///
    /// Bypasses batching and goes to the transport directly.
    ///
    /// # Errors
    ///
    /// Returns the ingestion error only for a failure of the whole
    /// exchange; per-key conflicts come back as `false` entries.
    pub async fn register_metrics(
        &self,
        token: &AuthToken,
        types: &BTreeMap<String, MetricType>,
    ) -> Result<HashMap<String, bool>> {
        if self.cancel.is_cancelled() {
            return Err(IngestError::ShuttingDown);
        }
        self.registration.register(token, types).await
    }

    /// Take the stream of permanently failed batches
    ///
    /// Returns `None` after the first call - there is one consumer.
    pub fn failure_stream(&self) -> Option<mpsc::Receiver<DeliveryFailure>> {
        self.failure_rx.lock().take()
    }

    /// Handle for reading client counters; stays valid after `shutdown`
    pub fn metrics_handle(&self) -> ClientMetricsHandle {
        ClientMetricsHandle::new(Arc::clone(&self.metrics))
    }

    /// Drain buffers and stop
    ///
    /// Each worker runs a final drain-and-submit bounded by the configured
    /// grace period; anything still undelivered is reported on the failure
    /// stream rather than blocking indefinitely. Safe to call behind an
    /// `Arc` and idempotent; operations after the first call return
    /// `IngestError::ShuttingDown`.
    pub async fn shutdown(&self) {
        tracing::info!("metrics client shutting down");
        self.cancel.cancel();

        // Workers bound their own final flush by the grace period; the
        // extra margin covers join overhead.
        let deadline = tokio::time::Instant::now()
            + self.config.shutdown_grace
            + std::time::Duration::from_secs(1);

        let tokens: Vec<AuthToken> = self.workers.iter().map(|e| e.key().clone()).collect();
        for token in tokens {
            let Some((_, handle)) = self.workers.remove(&token) else {
                continue;
            };
            if tokio::time::timeout_at(deadline, handle).await.is_err() {
                tracing::warn!("worker did not stop within the grace period, detaching");
            }
        }

        // A producer that passed the shutdown check before `cancel` fired
        // can enqueue into a buffer whose worker already drained and exited.
        // Sweep every partition so such stragglers are reported, not lost.
        for (token, items) in self.accumulator.sweep() {
            tracing::error!(
                undelivered = items.len(),
                "reporting measurements buffered after worker exit as failed"
            );
            self.pipeline.report_failure(
                Batch::new(token, items),
                0,
                "client shut down before delivery".into(),
            );
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            points_enqueued = snapshot.points_enqueued,
            backfill_enqueued = snapshot.backfill_enqueued,
            batches_delivered = snapshot.batches_delivered,
            batches_failed = snapshot.batches_failed,
            items_delivered = snapshot.items_delivered,
            items_failed = snapshot.items_failed,
            send_retries = snapshot.send_retries,
            backpressure_events = snapshot.backpressure_events,
            "metrics client stopped"
        );
    }

    /// Spawn the token's submission worker on first use
    fn ensure_worker(&self, token: &AuthToken) {
        self.workers.entry(token.clone()).or_insert_with(|| {
            let buffer = self.accumulator.buffer(token);
            tokio::spawn(run_worker(
                token.clone(),
                buffer,
                Arc::clone(&self.pipeline),
                self.config.batch_size,
                self.config.flush_interval,
                self.config.shutdown_grace,
                self.cancel.child_token(),
            ))
        });
    }
}

impl std::fmt::Debug for MetricsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsClient")
            .field("workers", &self.workers.len())
            .field("shutting_down", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
