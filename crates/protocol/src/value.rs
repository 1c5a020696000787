//! Numeric measurement values
//!
//! A measurement value is either an integer or a double. Doubles must be
//! finite; NaN and infinity are rejected at construction time by the
//! measurement builders.

/// Numeric value of a measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Integer value (counters, sizes)
    Int(i64),
    /// Floating-point value (gauges, ratios)
    Double(f64),
}

impl Value {
    /// Check that the value can be transmitted
    ///
    /// Integers are always finite; doubles are checked for NaN/infinity.
    #[inline]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Double(d) => d.is_finite(),
        }
    }

    /// View the value as an f64 (lossy for large integers)
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Double(d) => *d,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
        }
    }
}
