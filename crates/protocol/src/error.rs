//! Validation errors for measurement construction
//!
//! Every constructor in this crate validates its inputs and returns a
//! `ValidationError` on violation. Validation failures are local and never
//! retried - the caller must fix the measurement and resubmit.

use thiserror::Error;

/// Errors raised when constructing a measurement
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Metric name is empty (required field)
    #[error("metric name must not be empty")]
    EmptyMetricName,

    /// Metric name exceeds the maximum length
    #[error("metric name too long: {len} bytes exceeds maximum {max} bytes")]
    MetricNameTooLong {
        /// Actual length provided
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Backfill source is empty (required field)
    #[error("backfill source must not be empty")]
    EmptySource,

    /// No value was supplied to the builder
    #[error("a value is required")]
    MissingValue,

    /// Floating-point value is NaN or infinite
    #[error("value must be finite, got {0}")]
    NonFiniteValue(f64),

    /// Timestamp is further in the future than the allowed skew
    #[error(
        "timestamp {timestamp_ms} is more than {max_skew_ms}ms ahead of local time {now_ms}"
    )]
    TimestampInFuture {
        /// The offending timestamp (epoch millis)
        timestamp_ms: u64,
        /// Local clock at validation time (epoch millis)
        now_ms: u64,
        /// Configured skew tolerance in millis
        max_skew_ms: u64,
    },

    /// A dimension key is empty
    #[error("dimension key must not be empty (metric {metric:?})")]
    EmptyDimensionKey {
        /// Metric the dimension was attached to
        metric: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::EmptyMetricName;
        assert_eq!(err.to_string(), "metric name must not be empty");

        let err = ValidationError::MetricNameTooLong { len: 300, max: 256 };
        assert!(err.to_string().contains("300"));

        let err = ValidationError::NonFiniteValue(f64::NAN);
        assert!(err.to_string().contains("finite"));

        let err = ValidationError::TimestampInFuture {
            timestamp_ms: 2_000,
            now_ms: 1_000,
            max_skew_ms: 500,
        };
        assert!(err.to_string().contains("2000"));

        let err = ValidationError::EmptyDimensionKey {
            metric: "cpu.load".into(),
        };
        assert!(err.to_string().contains("cpu.load"));
    }
}
