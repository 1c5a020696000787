//! Historical backfill data
//!
//! A `HistoricalDatum` represents a past event, so its timestamp is
//! mandatory - there is no "default to now" for backfill. The remote
//! service must treat backfilled points as past-dated rather than live.

use std::time::Duration;

use crate::error::ValidationError;
use crate::point::{validate_metric_name, validate_timestamp};
use crate::value::Value;
use crate::{Result, DEFAULT_MAX_FUTURE_SKEW};

/// A measurement tagged with a mandatory past timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalDatum {
    /// Origin of the backfilled series (host, job, importer)
    source: String,

    /// Metric name
    metric: String,

    /// Numeric value
    value: Value,

    /// Timestamp in epoch millis (required)
    timestamp: u64,
}

impl HistoricalDatum {
    /// Construct a validated datum
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the source or metric name is empty, the
    /// value is not finite, or the timestamp is ahead of local time beyond
    /// the default skew tolerance.
    pub fn new(
        source: impl Into<String>,
        metric: impl Into<String>,
        value: impl Into<Value>,
        timestamp_ms: u64,
    ) -> Result<Self> {
        Self::with_skew(source, metric, value, timestamp_ms, DEFAULT_MAX_FUTURE_SKEW)
    }

    /// Construct with an explicit future-skew tolerance
    pub fn with_skew(
        source: impl Into<String>,
        metric: impl Into<String>,
        value: impl Into<Value>,
        timestamp_ms: u64,
        max_future_skew: Duration,
    ) -> Result<Self> {
        let source = source.into();
        if source.is_empty() {
            return Err(ValidationError::EmptySource);
        }

        let metric = metric.into();
        validate_metric_name(&metric)?;

        let value = value.into();
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(value.as_f64()));
        }

        validate_timestamp(timestamp_ms, max_future_skew)?;

        Ok(Self {
            source,
            metric,
            value,
            timestamp: timestamp_ms,
        })
    }

    /// Get the source
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the metric name
    #[inline]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Get the value
    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    /// Get the timestamp in epoch millis
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_datum() {
        let datum = HistoricalDatum::new("importer-1", "disk.used", 1024i64, 1_700_000_000_000);
        assert!(datum.is_ok());

        let datum = datum.unwrap();
        assert_eq!(datum.source(), "importer-1");
        assert_eq!(datum.metric(), "disk.used");
        assert_eq!(datum.value(), Value::Int(1024));
        assert_eq!(datum.timestamp(), 1_700_000_000_000);
    }

    #[test]
    fn test_empty_source_rejected() {
        let result = HistoricalDatum::new("", "disk.used", 1i64, 1_700_000_000_000);
        assert_eq!(result.unwrap_err(), ValidationError::EmptySource);
    }

    #[test]
    fn test_empty_metric_rejected() {
        let result = HistoricalDatum::new("importer-1", "", 1i64, 1_700_000_000_000);
        assert_eq!(result.unwrap_err(), ValidationError::EmptyMetricName);
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let result = HistoricalDatum::new("importer-1", "disk.used", f64::NAN, 1_700_000_000_000);
        assert!(matches!(
            result.unwrap_err(),
            ValidationError::NonFiniteValue(_)
        ));
    }

    #[test]
    fn test_far_future_timestamp_rejected() {
        let future = crate::now_millis() + 3_600_000;
        let result = HistoricalDatum::new("importer-1", "disk.used", 1i64, future);
        assert!(matches!(
            result.unwrap_err(),
            ValidationError::TimestampInFuture { .. }
        ));
    }
}
