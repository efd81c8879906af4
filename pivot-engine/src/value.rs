//! FILENAME: pivot-engine/src/value.rs
//! Scalar values flowing through the materialization pipeline.
//!
//! Label and measure values arrive from the compute service as loosely
//! typed scalars. Label values double as hash-map keys during indexing,
//! so the float wrapper gives them a NaN-stable `Eq`/`Hash`.

use serde::{Deserialize, Serialize};

// ============================================================================
// ORDERED FLOAT
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

// ============================================================================
// DATA VALUE
// ============================================================================

/// One scalar observed in a raw tuple: a label value or a measure.
///
/// `Empty` doubles as the blank placeholder in grids and overlays, which
/// keeps "no data for this combination" distinguishable from a real zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl DataValue {
    pub fn number(n: f64) -> Self {
        DataValue::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        DataValue::Text(s.into())
    }

    /// True for the blank placeholder.
    pub fn is_blank(&self) -> bool {
        matches!(self, DataValue::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(n.0),
            _ => None,
        }
    }
}

impl From<f64> for DataValue {
    fn from(n: f64) -> Self {
        DataValue::Number(OrderedFloat(n))
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Boolean(b)
    }
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Empty => Ok(()),
            DataValue::Number(n) => write!(f, "{}", n.0),
            DataValue::Text(s) => f.write_str(s),
            DataValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// One flat input row: row-label values, then column-label values, then
/// the already-aggregated measure, in schema field order.
pub type RawTuple = Vec<DataValue>;
