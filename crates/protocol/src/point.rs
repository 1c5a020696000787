//! Live data points
//!
//! A `DataPoint` is a single live measurement: metric name, numeric value,
//! optional timestamp, and a set of string dimensions. Points are built via
//! [`DataPointBuilder`], which validates on `build()` and returns an
//! immutable point.
//!
//! # Timestamps
//!
//! The timestamp is optional. A point without one is transmitted without a
//! timestamp and the remote service stamps it at receipt, so client-side
//! queueing delay never back-dates a live point. A supplied timestamp may
//! not be ahead of the local clock by more than the configured skew
//! tolerance.
//!
//! # Example
//!
//! ```
//! use flare_protocol::DataPoint;
//!
//! let point = DataPoint::builder("cpu.load")
//!     .value(0.42)
//!     .dimension("host", "web-01")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(point.metric(), "cpu.load");
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ValidationError;
use crate::value::Value;
use crate::{now_millis, Result, DEFAULT_MAX_FUTURE_SKEW, MAX_METRIC_NAME_LENGTH};

/// A single live measurement
///
/// Immutable once constructed; all accessors borrow. Uniqueness at the
/// remote service is per (metric, dimensions, timestamp).
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Metric name (non-empty, validated)
    metric: String,

    /// Numeric value (finite, validated)
    value: Value,

    /// Optional timestamp in epoch millis
    timestamp: Option<u64>,

    /// Dimensions; BTreeMap gives unique keys and a stable order
    dimensions: BTreeMap<String, String>,
}

impl DataPoint {
    /// Start building a point for the given metric
    pub fn builder(metric: impl Into<String>) -> DataPointBuilder {
        DataPointBuilder::new(metric)
    }

    /// Build a point with only a metric and value
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the metric name is empty/too long or the
    /// value is not finite.
    pub fn new(metric: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        Self::builder(metric).value(value).build()
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

    /// Get the timestamp, if one was supplied
    #[inline]
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Get the dimensions
    #[inline]
    pub fn dimensions(&self) -> &BTreeMap<String, String> {
        &self.dimensions
    }
}

/// Builder for [`DataPoint`]
///
/// # Required Fields
///
/// - `metric` - set at construction
/// - `value` - numeric value; `build()` fails without one
#[derive(Debug, Clone)]
pub struct DataPointBuilder {
    metric: String,
    value: Option<Value>,
    timestamp: Option<u64>,
    dimensions: BTreeMap<String, String>,
    max_future_skew: Duration,
}

impl DataPointBuilder {
    /// Create a builder for the given metric
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            value: None,
            timestamp: None,
            dimensions: BTreeMap::new(),
            max_future_skew: DEFAULT_MAX_FUTURE_SKEW,
        }
    }

    /// Set the value (required)
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set an explicit timestamp in epoch millis
    #[must_use]
    pub fn timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    /// Add a dimension
    ///
    /// Keys are unique; setting the same key twice keeps the last value.
    #[must_use]
    pub fn dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(key.into(), value.into());
        self
    }

    /// Override the allowed future clock skew for timestamp validation
    #[must_use]
    pub fn max_future_skew(mut self, skew: Duration) -> Self {
        self.max_future_skew = skew;
        self
    }

    /// Validate and build the point
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - the metric name is empty or exceeds the maximum length
    /// - no value was set, or the value is NaN/infinite
    /// - the timestamp is ahead of local time beyond the skew tolerance
    /// - any dimension key is empty
    pub fn build(self) -> Result<DataPoint> {
        validate_metric_name(&self.metric)?;

        let value = self.value.ok_or(ValidationError::MissingValue)?;
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(value.as_f64()));
        }

        if let Some(ts) = self.timestamp {
            validate_timestamp(ts, self.max_future_skew)?;
        }

        for key in self.dimensions.keys() {
            if key.is_empty() {
                return Err(ValidationError::EmptyDimensionKey {
                    metric: self.metric.clone(),
                });
            }
        }

        Ok(DataPoint {
            metric: self.metric,
            value,
            timestamp: self.timestamp,
            dimensions: self.dimensions,
        })
    }
}

/// Check a metric name for emptiness and length
pub(crate) fn validate_metric_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyMetricName);
    }
    if name.len() > MAX_METRIC_NAME_LENGTH {
        return Err(ValidationError::MetricNameTooLong {
            len: name.len(),
            max: MAX_METRIC_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Check that a timestamp is not in the future beyond the allowed skew
pub(crate) fn validate_timestamp(timestamp_ms: u64, max_skew: Duration) -> Result<()> {
    let now_ms = now_millis();
    let max_skew_ms = max_skew.as_millis() as u64;
    if timestamp_ms > now_ms.saturating_add(max_skew_ms) {
        return Err(ValidationError::TimestampInFuture {
            timestamp_ms,
            now_ms,
            max_skew_ms,
        });
    }
    Ok(())
}
