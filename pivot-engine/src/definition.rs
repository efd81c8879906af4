//! FILENAME: pivot-engine/src/definition.rs
//! Pivot Schema Definition - the serializable configuration.
//!
//! This module contains the types that DESCRIBE a pivot request.
//! These structures are designed to be:
//! - Serializable (for saving/sharing schemas)
//! - Sent to the compute service as-is
//! - Immutable snapshots of user intent

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::RawTuple;

// ============================================================================
// FIELDS
// ============================================================================

/// Coarse type of a source column, as reported by the raw report.
/// Only the numeric/other split matters for value-field eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Numeric,
    Other,
}

/// A column of the source table. Immutable, sourced from the raw report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn numeric(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            field_type: FieldType::Numeric,
        }
    }

    pub fn other(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            field_type: FieldType::Other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.field_type == FieldType::Numeric
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Aggregation functions the compute service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Count,
    Sum,
    Min,
    Max,
    Average,
    Product,
    StdDev,
    Variance,
}

impl AggregationType {
    /// Every selectable function, `Count` first.
    pub const ALL: [AggregationType; 8] = [
        AggregationType::Count,
        AggregationType::Sum,
        AggregationType::Min,
        AggregationType::Max,
        AggregationType::Average,
        AggregationType::Product,
        AggregationType::StdDev,
        AggregationType::Variance,
    ];

    /// Wire name understood by the compute service.
    pub fn name(&self) -> &'static str {
        match self {
            AggregationType::Count => "count",
            AggregationType::Sum => "sum",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::Average => "avg",
            AggregationType::Product => "product",
            AggregationType::StdDev => "standard deviation",
            AggregationType::Variance => "variance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|function| function.name().eq_ignore_ascii_case(name))
    }

    /// True for the functions that only accept numeric value fields.
    /// `Count` accepts any field.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, AggregationType::Count)
    }
}

/// Sort order for the upstream query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

// ============================================================================
// PIVOT SCHEMA
// ============================================================================

/// The complete, serializable pivot request sent to the compute service.
///
/// Label lists keep the user's selection order: row label 0 is the most
/// significant grid dimension, and the same holds for columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotSchema {
    pub table_name: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub page_label: Option<String>,
    pub function: Option<AggregationType>,
    pub value_field: Option<String>,
    pub filter_field: Option<String>,
    pub filter_value: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: SortOrder,
    pub alias_map: HashMap<String, String>,
    pub summary_function: Option<AggregationType>,
}

impl PivotSchema {
    pub fn new(table_name: impl Into<String>) -> Self {
        PivotSchema {
            table_name: table_name.into(),
            ..PivotSchema::default()
        }
    }

    pub fn row_label_count(&self) -> usize {
        self.row_labels.len()
    }

    pub fn column_label_count(&self) -> usize {
        self.column_labels.len()
    }
}

// ============================================================================
// RAW REPORT
// ============================================================================

/// A table's column list and ungrouped rows, as fetched from the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    pub columns: Vec<Field>,
    pub rows: Vec<RawTuple>,
}
