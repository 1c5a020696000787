//! Flare Protocol - Measurement model for the Flare ingestion client
//!
//! This crate provides the value types that flow through the client:
//! - [`DataPoint`] - a single live measurement (metric, value, dimensions)
//! - [`HistoricalDatum`] - a past-dated measurement submitted via backfill
//! - [`MetricType`] - aggregation semantics bound to a metric name
//! - [`Measurement`] / [`Batch`] - the ordered unit handed to the pipeline
//! - [`AuthToken`] - the opaque per-call credential
//!
//! # Design Principles
//!
//! - **Validated on construction**: a `DataPoint` or `HistoricalDatum` that
//!   exists is well-formed; nothing downstream re-validates or auto-corrects.
//! - **Immutable**: value types expose accessors only.
//! - **Credential-safe**: `AuthToken` redacts itself in `Debug` and `Display`
//!   so a token can never leak through logging.

mod auth;
mod backfill;
mod batch;
mod error;
mod metric_type;
mod point;
mod value;

pub use auth::AuthToken;
pub use backfill::HistoricalDatum;
pub use batch::{Batch, Measurement};
pub use error::ValidationError;
pub use metric_type::MetricType;
pub use point::{DataPoint, DataPointBuilder};
pub use value::Value;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Result type for model construction
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Default tolerance for timestamps ahead of the local clock
pub const DEFAULT_MAX_FUTURE_SKEW: Duration = Duration::from_secs(300);

/// Maximum length of a metric name in bytes
pub const MAX_METRIC_NAME_LENGTH: usize = 256;

/// Current wall-clock time as milliseconds since the Unix epoch
///
/// Timestamps throughout the model are epoch milliseconds. A clock set
/// before 1970 yields 0 rather than panicking.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod point_test;
