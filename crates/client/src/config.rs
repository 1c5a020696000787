//! Client configuration
//!
//! All knobs for the reliability layer: batching thresholds, buffer
//! capacity and backpressure mode, retry policy, and shutdown grace.
//! Deserializes from config files (durations accept humantime strings like
//! `"250ms"`) and supports `with_*` builders for programmatic setup.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default number of items per batch before a flush triggers
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default hard capacity of a per-token buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Errors from configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Batch size must be at least 1
    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,

    /// Buffer capacity must hold at least one batch
    #[error("buffer_capacity {capacity} is smaller than batch_size {batch_size}")]
    CapacityBelowBatchSize {
        capacity: usize,
        batch_size: usize,
    },

    /// At least one delivery attempt is required
    #[error("retry.max_attempts must be at least 1")]
    ZeroRetryAttempts,

    /// Backoff multiplier must not shrink delays
    #[error("retry.multiplier must be >= 1.0, got {0}")]
    MultiplierBelowOne(f64),

    /// Jitter is a fraction of the delay
    #[error("retry.jitter must be within 0.0..=1.0, got {0}")]
    JitterOutOfRange(f64),
}

/// Policy applied when a per-token buffer reaches its hard capacity
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureMode {
    /// `enqueue` fails immediately with a buffer-full error (default)
    #[default]
    FailFast,
    /// `enqueue` waits until capacity frees or `enqueue_timeout` elapses
    Block,
}

/// Retry policy for transient transport failures
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total delivery attempts (first try included)
    pub max_attempts: usize,

    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,

    /// Upper bound on any single delay
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,

    /// Exponential growth factor between retries
    pub multiplier: f64,

    /// Uniform jitter as a fraction of the delay (0.2 = +/-20%)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

/// Configuration for [`MetricsClient`](crate::MetricsClient)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Item count that triggers an immediate flush
    pub batch_size: usize,

    /// Maximum time a buffered item waits before a time-based flush
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Hard capacity of each per-token buffer
    pub buffer_capacity: usize,

    /// What `enqueue` does at capacity
    pub backpressure: BackpressureMode,

    /// How long a blocking enqueue waits for capacity (Block mode only)
    #[serde(with = "humantime_serde")]
    pub enqueue_timeout: Duration,

    /// Retry policy for transient transport failures
    pub retry: RetryConfig,

    /// Bound on the final drain-and-flush at shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,

    /// Allowed clock skew for backfill timestamps
    #[serde(with = "humantime_serde")]
    pub max_future_skew: Duration,

    /// Capacity of the delivery-failure channel
    pub failure_queue_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: Duration::from_secs(1),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            backpressure: BackpressureMode::FailFast,
            enqueue_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
            shutdown_grace: Duration::from_secs(10),
            max_future_skew: Duration::from_secs(300),
            failure_queue_size: 256,
        }
    }
}

impl ClientConfig {
    /// Set the flush item-count threshold
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the time-based flush trigger
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the per-token buffer capacity
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set the backpressure mode
    #[must_use]
    pub fn with_backpressure(mut self, mode: BackpressureMode) -> Self {
        self.backpressure = mode;
        self
    }

    /// Set the blocking-enqueue timeout
    #[must_use]
    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the shutdown grace period
    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Check the configuration for contradictions
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.buffer_capacity < self.batch_size {
            return Err(ConfigError::CapacityBelowBatchSize {
                capacity: self.buffer_capacity,
                batch_size: self.batch_size,
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroRetryAttempts);
        }
        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::MultiplierBelowOne(self.retry.multiplier));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::JitterOutOfRange(self.retry.jitter));
        }
        Ok(())
    }
}
