//! FILENAME: pivot-engine/src/index.rs
//! Label Indexer - dense ordinals for observed label values.
//!
//! Each label position of a page gets a `LabelDimension`: the distinct
//! values seen at that position, in first-occurrence order, plus the
//! derived value -> ordinal map. First-occurrence ordering (rather than
//! sorted) is a documented property: two tuple streams carrying the same
//! tuples in different orders may legally discover values in different
//! orders. Sorting, when the user asks for it, happens upstream.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::value::{DataValue, RawTuple};

/// Position of a value within one label dimension, in [0, cardinality).
pub type Ordinal = usize;

// ============================================================================
// LABEL DIMENSION
// ============================================================================

/// The ordered distinct values of one label field on one page.
///
/// Serializes as the plain value list; the ordinal map is derived state
/// and is rebuilt on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DataValue>", into = "Vec<DataValue>")]
pub struct LabelDimension {
    /// Distinct values in first-occurrence order.
    values: Vec<DataValue>,

    /// Derived lookup: value -> position in `values`.
    ordinals: FxHashMap<DataValue, Ordinal>,
}

impl From<Vec<DataValue>> for LabelDimension {
    fn from(values: Vec<DataValue>) -> Self {
        let mut dimension = LabelDimension::new();
        for value in &values {
            dimension.observe(value);
        }
        dimension
    }
}

impl From<LabelDimension> for Vec<DataValue> {
    fn from(dimension: LabelDimension) -> Self {
        dimension.values
    }
}

impl LabelDimension {
    pub fn new() -> Self {
        LabelDimension::default()
    }

    /// Records one observed value. Values already seen keep their ordinal.
    pub fn observe(&mut self, value: &DataValue) {
        if !self.ordinals.contains_key(value) {
            self.ordinals.insert(value.clone(), self.values.len());
            self.values.push(value.clone());
        }
    }

    pub fn ordinal(&self, value: &DataValue) -> Option<Ordinal> {
        self.ordinals.get(value).copied()
    }

    pub fn value(&self, ordinal: Ordinal) -> Option<&DataValue> {
        self.values.get(ordinal)
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    pub fn cardinality(&self) -> usize {
        self.values.len()
    }
}

// ============================================================================
// INDEXING
// ============================================================================

/// Scans one page's tuples and builds its row and column dimensions.
///
/// Runs over the full tuple set before any offset computation happens, so
/// every label value a data tuple carries is guaranteed an ordinal by the
/// time the grid is filled.
pub fn index_labels(
    tuples: &[RawTuple],
    row_label_count: usize,
    column_label_count: usize,
) -> (Vec<LabelDimension>, Vec<LabelDimension>) {
    let mut row_dims = vec![LabelDimension::new(); row_label_count];
    let mut column_dims = vec![LabelDimension::new(); column_label_count];

    for tuple in tuples {
        for (position, dimension) in row_dims.iter_mut().enumerate() {
            if let Some(value) = tuple.get(position) {
                dimension.observe(value);
            }
        }
        for (position, dimension) in column_dims.iter_mut().enumerate() {
            if let Some(value) = tuple.get(row_label_count + position) {
                dimension.observe(value);
            }
        }
    }

    (row_dims, column_dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(values: &[&str]) -> RawTuple {
        values.iter().map(|v| DataValue::text(*v)).collect()
    }

    #[test]
    fn test_first_occurrence_order() {
        let tuples = vec![
            tuple(&["West", "Q1", "10"]),
            tuple(&["West", "Q2", "20"]),
            tuple(&["East", "Q1", "5"]),
        ];
        let (rows, cols) = index_labels(&tuples, 1, 1);

        assert_eq!(
            rows[0].values(),
            &[DataValue::text("West"), DataValue::text("East")]
        );
        assert_eq!(
            cols[0].values(),
            &[DataValue::text("Q1"), DataValue::text("Q2")]
        );
        assert_eq!(rows[0].ordinal(&DataValue::text("East")), Some(1));
        assert_eq!(rows[0].ordinal(&DataValue::text("North")), None);
    }

    #[test]
    fn test_duplicates_keep_their_ordinal() {
        let mut dimension = LabelDimension::new();
        dimension.observe(&DataValue::text("a"));
        dimension.observe(&DataValue::text("b"));
        dimension.observe(&DataValue::text("a"));

        assert_eq!(dimension.cardinality(), 2);
        assert_eq!(dimension.ordinal(&DataValue::text("a")), Some(0));
        assert_eq!(dimension.value(1), Some(&DataValue::text("b")));
    }

    #[test]
    fn test_stream_order_decides_value_order() {
        let forward = vec![tuple(&["West", "Q1", "1"]), tuple(&["East", "Q1", "2"])];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        let (rows_fwd, _) = index_labels(&forward, 1, 1);
        let (rows_rev, _) = index_labels(&reversed, 1, 1);

        assert_eq!(rows_fwd[0].values()[0], DataValue::text("West"));
        assert_eq!(rows_rev[0].values()[0], DataValue::text("East"));
    }

    #[test]
    fn test_serializes_as_value_list() {
        let mut dimension = LabelDimension::new();
        dimension.observe(&DataValue::text("West"));
        dimension.observe(&DataValue::text("East"));

        let json = serde_json::to_string(&dimension).unwrap();
        assert_eq!(json, r#"[{"Text":"West"},{"Text":"East"}]"#);

        let back: LabelDimension = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dimension);
        assert_eq!(back.ordinal(&DataValue::text("East")), Some(1));
    }

    #[test]
    fn test_zero_dimensions() {
        let tuples = vec![tuple(&["Q1", "10"])];
        let (rows, cols) = index_labels(&tuples, 0, 1);
        assert!(rows.is_empty());
        assert_eq!(cols[0].cardinality(), 1);
    }
}
