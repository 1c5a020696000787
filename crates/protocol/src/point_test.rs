use std::time::Duration;

use crate::error::ValidationError;
use crate::point::DataPoint;
use crate::value::Value;
use crate::{now_millis, MAX_METRIC_NAME_LENGTH};

// =============================================================================
// Builder tests
// =============================================================================

#[test]
fn test_build_minimal_point() {
    let point = DataPoint::new("cpu.load", 0.42).unwrap();

    assert_eq!(point.metric(), "cpu.load");
    assert_eq!(point.value(), Value::Double(0.42));
    assert_eq!(point.timestamp(), None);
    assert!(point.dimensions().is_empty());
}

#[test]
fn test_build_full_point() {
    let point = DataPoint::builder("cpu.load")
        .value(0.42)
        .timestamp(1_700_000_000_000)
        .dimension("host", "web-01")
        .dimension("region", "eu-west-1")
        .build()
        .unwrap();

    assert_eq!(point.timestamp(), Some(1_700_000_000_000));
    assert_eq!(point.dimensions().len(), 2);
    assert_eq!(point.dimensions()["host"], "web-01");
}

#[test]
fn test_dimension_keys_unique_last_write_wins() {
    let point = DataPoint::builder("cpu.load")
        .value(1i64)
        .dimension("host", "a")
        .dimension("host", "b")
        .build()
        .unwrap();

    assert_eq!(point.dimensions().len(), 1);
    assert_eq!(point.dimensions()["host"], "b");
}

// =============================================================================
// Validation tests
// =============================================================================

#[test]
fn test_empty_metric_rejected() {
    let result = DataPoint::new("", 1i64);
    assert_eq!(result.unwrap_err(), ValidationError::EmptyMetricName);
}

#[test]
fn test_overlong_metric_rejected() {
    let name = "m".repeat(MAX_METRIC_NAME_LENGTH + 1);
    let result = DataPoint::new(name, 1i64);
    assert!(matches!(
        result.unwrap_err(),
        ValidationError::MetricNameTooLong { .. }
    ));
}

#[test]
fn test_missing_value_rejected() {
    let result = DataPoint::builder("cpu.load").build();
    assert_eq!(result.unwrap_err(), ValidationError::MissingValue);
}

#[test]
fn test_nan_rejected() {
    let result = DataPoint::new("cpu.load", f64::NAN);
    assert!(matches!(
        result.unwrap_err(),
        ValidationError::NonFiniteValue(_)
    ));
}

#[test]
fn test_infinity_rejected() {
    let result = DataPoint::new("cpu.load", f64::INFINITY);
    assert!(matches!(
        result.unwrap_err(),
        ValidationError::NonFiniteValue(_)
    ));
}

#[test]
fn test_future_timestamp_within_skew_accepted() {
    let slightly_ahead = now_millis() + 1_000;
    let result = DataPoint::builder("cpu.load")
        .value(1i64)
        .timestamp(slightly_ahead)
        .build();
    assert!(result.is_ok());
}

#[test]
fn test_future_timestamp_beyond_skew_rejected() {
    let far_ahead = now_millis() + 3_600_000;
    let result = DataPoint::builder("cpu.load")
        .value(1i64)
        .timestamp(far_ahead)
        .build();
    assert!(matches!(
        result.unwrap_err(),
        ValidationError::TimestampInFuture { .. }
    ));
}

#[test]
fn test_custom_skew_tolerance() {
    let ahead = now_millis() + 10_000;

    // Default tolerance (5 min) accepts it
    let ok = DataPoint::builder("cpu.load")
        .value(1i64)
        .timestamp(ahead)
        .build();
    assert!(ok.is_ok());

    // A 1s tolerance rejects it
    let err = DataPoint::builder("cpu.load")
        .value(1i64)
        .timestamp(ahead)
        .max_future_skew(Duration::from_secs(1))
        .build();
    assert!(err.is_err());
}

#[test]
fn test_empty_dimension_key_rejected() {
    let result = DataPoint::builder("cpu.load")
        .value(1i64)
        .dimension("", "web-01")
        .build();
    assert!(matches!(
        result.unwrap_err(),
        ValidationError::EmptyDimensionKey { .. }
    ));
}
