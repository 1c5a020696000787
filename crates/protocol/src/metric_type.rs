//! Metric type registration semantics
//!
//! A metric name can be registered with exactly one type for its lifetime at
//! the remote service. The type describes how the service aggregates values
//! reported under that name.

/// Aggregation semantics for a metric name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// Delta count per reporting interval
    Counter,
    /// Point-in-time value, last write wins
    Gauge,
    /// Monotonically increasing total; the service computes deltas
    CumulativeCounter,
}

impl MetricType {
    /// Wire/registry name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::CumulativeCounter => "cumulative_counter",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
