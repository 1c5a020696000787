//! Flare Client - reliable transport for metrics ingestion
//!
//! This crate turns the three-operation ingestion contract into a correct,
//! fault-tolerant client:
//!
//! - [`MetricsClient::add_data_points`] - live submission, buffered and
//!   batched per auth token
//! - [`MetricsClient::backfill_data_points`] - historical submission through
//!   the same pipeline, distinguished downstream
//! - [`MetricsClient::register_metrics`] - unbatched metric-type
//!   registration with per-key results
//!
//! # Architecture
//!
//! ```text
//! caller -> MetricsClient -> Accumulator (per-token buffers)
//!                              |  drain
//!                              v
//!                         SubmissionPipeline -- Encoder --> bytes
//!                              |                              |
//!                              +------- Transport <-----------+
//!
//! register_metrics -> RegistrationCoordinator -> Transport (direct)
//! ```
//!
//! The crate owns batching, backpressure, retry with backoff, per-token
//! ordering, and failure accounting. The wire format and the network stack
//! are external: implement [`Encoder`] and [`Transport`] to bind the client
//! to a concrete service.
//!
//! # Guarantees
//!
//! - Measurements of one token reach the transport in submission order
//! - A batch is never split across network calls and never delivered twice
//! - Nothing is silently dropped: rejected enqueues error, and permanently
//!   failed batches are counted, logged, and published on the failure stream

mod accumulator;
mod backoff;
mod client;
mod config;
mod error;
mod metrics;
mod pipeline;
mod registration;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::MetricsClient;
pub use config::{
    BackpressureMode, ClientConfig, ConfigError, RetryConfig, DEFAULT_BATCH_SIZE,
    DEFAULT_BUFFER_CAPACITY,
};
pub use error::{IngestError, Result};
pub use metrics::{ClientMetrics, ClientMetricsHandle, ClientMetricsSnapshot};
pub use pipeline::DeliveryFailure;
pub use transport::{EncodeError, Encoder, RegistrationReply, Transport, TransportError};

// Re-export the measurement model for convenience
pub use flare_protocol::{
    AuthToken, Batch, DataPoint, DataPointBuilder, HistoricalDatum, Measurement, MetricType,
    ValidationError, Value,
};
