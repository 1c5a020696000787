//! Batch - the ordered unit of network submission
//!
//! A `Batch` is an ordered sequence of measurements accumulated under one
//! auth token. From the moment it is drained from the accumulator the batch
//! is owned exclusively by the submission pipeline until it is acknowledged
//! or permanently failed.
//!
//! # Design
//!
//! - A batch never mixes auth tokens (single token field, checked nowhere
//!   else because it is unrepresentable otherwise)
//! - Items keep their enqueue order
//! - A batch is never split across network calls; retries resend the whole
//!   batch

use crate::auth::AuthToken;
use crate::backfill::HistoricalDatum;
use crate::point::DataPoint;
use crate::value::Value;

/// A live or backfilled measurement
///
/// Backfill stays distinguishable all the way to the encoder so the remote
/// service can treat backfilled points as past-dated rather than "now".
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Live data point submitted via `add_data_points`
    Live(DataPoint),
    /// Historical datum submitted via `backfill_data_points`
    Backfill(HistoricalDatum),
}

impl Measurement {
    /// Metric name of the underlying measurement
    #[inline]
    pub fn metric(&self) -> &str {
        match self {
            Self::Live(p) => p.metric(),
            Self::Backfill(d) => d.metric(),
        }
    }

    /// Numeric value of the underlying measurement
    #[inline]
    pub fn value(&self) -> Value {
        match self {
            Self::Live(p) => p.value(),
            Self::Backfill(d) => d.value(),
        }
    }

    /// Timestamp, if present (always present for backfill)
    #[inline]
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Self::Live(p) => p.timestamp(),
            Self::Backfill(d) => Some(d.timestamp()),
        }
    }

    /// Whether this is a backfilled measurement
    #[inline]
    pub fn is_backfill(&self) -> bool {
        matches!(self, Self::Backfill(_))
    }
}

impl From<DataPoint> for Measurement {
    fn from(p: DataPoint) -> Self {
        Self::Live(p)
    }
}

impl From<HistoricalDatum> for Measurement {
    fn from(d: HistoricalDatum) -> Self {
        Self::Backfill(d)
    }
}

/// Ordered group of measurements submitted in one network exchange
#[derive(Debug, Clone)]
pub struct Batch {
    /// Token the items were accumulated under
    token: AuthToken,

    /// Measurements in enqueue order
    items: Vec<Measurement>,
}

impl Batch {
    /// Create a batch from drained items
    pub fn new(token: AuthToken, items: Vec<Measurement>) -> Self {
        Self { token, items }
    }

    /// Get the auth token
    #[inline]
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Get the measurements in order
    #[inline]
    pub fn items(&self) -> &[Measurement] {
        &self.items
    }

    /// Number of measurements in the batch
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the batch is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of backfilled measurements in the batch
    pub fn backfill_count(&self) -> usize {
        self.items.iter().filter(|m| m.is_backfill()).count()
    }

    /// Consume the batch, returning its items
    pub fn into_items(self) -> Vec<Measurement> {
        self.items
    }
}
