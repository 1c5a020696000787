//! Encoder and Transport seams
//!
//! The reliability layer does not own a wire format or a network stack. It
//! consumes two capabilities:
//!
//! - [`Encoder`] - turns a typed [`Batch`] into bytes; pure, no I/O
//! - [`Transport`] - puts bytes on the wire and returns a response or a
//!   classified failure; owns connection pooling and TLS
//!
//! Implement both to bind the client to a concrete service.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use flare_protocol::{AuthToken, Batch, MetricType};

/// Failure to encode a batch
///
/// Encoding failures are permanent: the same batch would fail again, so the
/// pipeline never retries them.
#[derive(Debug, Error)]
#[error("failed to encode batch: {0}")]
pub struct EncodeError(pub String);

/// Pure batch-to-bytes capability
pub trait Encoder: Send + Sync {
    /// Encode a batch into its wire representation
    ///
    /// Must be pure: no I/O, no mutation, same bytes for the same batch.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError` if the batch cannot be represented in the
    /// wire format.
    fn encode(&self, batch: &Batch) -> Result<Bytes, EncodeError>;

    /// Encoder name for logging/debugging
    fn name(&self) -> &'static str;
}

/// Transport failures, classified for the retry policy
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request timed out (transient)
    #[error("request timed out")]
    Timeout,

    /// Connection dropped mid-exchange (transient)
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    /// Server-side failure, 5xx-equivalent (transient)
    #[error("server unavailable (status {status})")]
    ServerUnavailable {
        /// Status code reported by the service
        status: u16,
    },

    /// Underlying I/O failure (transient)
    #[error("transport I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// Credential rejected by the service (permanent)
    #[error("authentication rejected")]
    AuthRejected,

    /// Service could not parse the payload (permanent)
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl TransportError {
    /// Whether the failure is worth retrying
    ///
    /// Transient failures are retried with backoff up to the configured
    /// attempt limit; permanent failures escalate immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionReset(_) | Self::ServerUnavailable { .. } | Self::Io { .. } => {
                true
            }
            Self::AuthRejected | Self::MalformedPayload(_) => false,
        }
    }
}

/// Per-key outcome of a registration exchange the service fully received
#[derive(Debug, Clone, Default)]
pub struct RegistrationReply {
    /// true = newly registered or already matching; false = type conflict
    pub results: HashMap<String, bool>,
}

/// Network capability consumed by the pipeline and coordinator
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver an encoded batch under the given credential
    ///
    /// # Errors
    ///
    /// Returns a classified `TransportError`; the pipeline decides whether
    /// to retry based on [`TransportError::is_transient`].
    async fn send_batch(&self, token: &AuthToken, payload: Bytes) -> Result<(), TransportError>;

    /// Register metric types, one outcome per requested name
    ///
    /// # Errors
    ///
    /// Returns `TransportError` only when the whole exchange failed; partial
    /// results belong in the reply.
    async fn register(
        &self,
        token: &AuthToken,
        types: &BTreeMap<String, MetricType>,
    ) -> Result<RegistrationReply, TransportError>;

    /// Transport name for logging/debugging
    fn name(&self) -> &'static str;
}
