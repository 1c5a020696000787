//! Client error taxonomy
//!
//! Callers handle a single ingestion-error kind, [`IngestError`]. Transient
//! transport failures are retried internally and only surface here once the
//! retry budget is exhausted; validation and backpressure errors surface
//! synchronously from the originating call.

use thiserror::Error;

use flare_protocol::ValidationError;

use crate::transport::{EncodeError, TransportError};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// The single failure kind surfaced by ingestion operations
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed measurement - local, never retried
    #[error("invalid measurement: {0}")]
    Validation(#[from] ValidationError),

    /// Local backpressure - the buffer is at capacity
    ///
    /// The caller may retry after backing off; nothing was dropped.
    #[error("buffer full at capacity {capacity}")]
    BufferFull {
        /// Configured hard capacity of the per-token buffer
        capacity: usize,
    },

    /// Batch could not be encoded - permanent, never retried
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Transient failures exhausted the retry budget
    #[error("all {attempts} delivery attempts failed: {source}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: usize,
        /// The last transient error observed
        #[source]
        source: TransportError,
    },

    /// Permanent transport failure - escalated immediately, never retried
    #[error("permanent transport failure: {0}")]
    Transport(TransportError),

    /// The client has been shut down
    #[error("client is shutting down")]
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::BufferFull { capacity: 100 };
        assert!(err.to_string().contains("100"));

        let err = IngestError::RetriesExhausted {
            attempts: 5,
            source: TransportError::Timeout,
        };
        assert!(err.to_string().contains("5"));
        assert!(err.to_string().contains("timed out"));

        let err = IngestError::ShuttingDown;
        assert!(err.to_string().contains("shutting down"));
    }

    #[test]
    fn test_validation_error_converts() {
        let err: IngestError = ValidationError::EmptyMetricName.into();
        assert!(matches!(err, IngestError::Validation(_)));
    }
}
