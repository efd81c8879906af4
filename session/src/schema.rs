//! FILENAME: session/src/schema.rs
//! Live selection state of the pivot wizard.
//!
//! Holds both the user's selections and the derived pools they may pick
//! from next. The pools cascade: selecting row labels redefines the
//! column pool, selecting column labels redefines the page pool, and the
//! chosen function decides which page-pool fields qualify as values. Each
//! mutation helper encodes exactly which downstream selections its step
//! clears, so the cascade rules live in one place.
//!
//! Invariant: row, column and page assignments are pairwise disjoint;
//! each pool is built by subtracting the selections made upstream of it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pivot_engine::{AggregationType, Field, PivotSchema, SortOrder};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Display name used when sharing the schema.
    pub name: String,

    /// Pool of fields selectable as row labels: the report's columns.
    pub row_labels: Vec<Field>,
    pub selected_row_labels: Vec<Field>,

    /// Pool for column labels: the row pool minus the selected row labels.
    pub column_labels: Vec<Field>,
    pub selected_column_labels: Vec<Field>,

    /// Pool for the page label: the column pool minus the selected columns.
    pub page_labels: Vec<Field>,
    pub selected_page_label: Option<String>,

    pub selected_function: Option<AggregationType>,

    /// Pool of value fields compatible with the selected function.
    pub possible_values: Vec<Field>,
    pub selected_value: Option<String>,

    pub filter_fields: Vec<Field>,
    pub selected_filter_field: Option<String>,
    pub filter_value: Option<String>,

    pub sort_fields: Vec<Field>,
    pub selected_sort_field: Option<String>,
    pub sort_order: SortOrder,

    /// field name -> display alias
    pub alias_map: HashMap<String, String>,

    pub summary_function: Option<AggregationType>,
}

impl TableSchema {
    /// Fresh schema for a newly loaded raw report: the report's columns
    /// seed the row-label and filter pools.
    pub fn for_columns(columns: Vec<Field>) -> Self {
        TableSchema {
            filter_fields: columns.clone(),
            row_labels: columns,
            ..TableSchema::default()
        }
    }

    /// Back to defaults, keeping the discovered row-label pool.
    pub fn reset(&self) -> Self {
        TableSchema {
            row_labels: self.row_labels.clone(),
            ..TableSchema::default()
        }
    }

    /// Resolves selection names against a pool, preserving the order the
    /// names were given in. Names the pool does not contain are skipped.
    fn resolve(pool: &[Field], names: &[String]) -> Vec<Field> {
        names
            .iter()
            .filter_map(|name| pool.iter().find(|field| field.name == *name).cloned())
            .collect()
    }

    fn subtract(pool: &[Field], names: &[String]) -> Vec<Field> {
        pool.iter()
            .filter(|field| !names.contains(&field.name))
            .cloned()
            .collect()
    }

    /// Sets the row labels and rebuilds the column pool from what is
    /// left. Everything chosen downstream of the row axis is cleared.
    pub fn with_row_labels(&self, names: &[String]) -> Self {
        let selected = Self::resolve(&self.row_labels, names);
        TableSchema {
            selected_row_labels: selected.clone(),
            column_labels: Self::subtract(&self.row_labels, names),
            selected_column_labels: Vec::new(),
            selected_page_label: None,
            selected_function: None,
            selected_value: None,
            sort_fields: selected,
            selected_sort_field: None,
            selected_filter_field: None,
            ..self.clone()
        }
    }

    /// Sets the column labels (selection order, not source order) and
    /// rebuilds the page pool from what is left.
    pub fn with_column_labels(&self, names: &[String]) -> Self {
        TableSchema {
            selected_column_labels: Self::resolve(&self.column_labels, names),
            page_labels: Self::subtract(&self.column_labels, names),
            selected_page_label: None,
            selected_function: None,
            selected_value: None,
            ..self.clone()
        }
    }

    pub fn with_page_label(&self, label: Option<String>) -> Self {
        TableSchema {
            selected_page_label: label,
            selected_function: None,
            selected_value: None,
            ..self.clone()
        }
    }

    /// Sets the function and recomputes the value-field pool: page-pool
    /// fields minus the active page label, numeric fields only for the
    /// numeric functions. `count` accepts any field.
    pub fn with_function(&self, function: AggregationType) -> Self {
        let possible_values = self
            .page_labels
            .iter()
            .filter(|field| Some(&field.name) != self.selected_page_label.as_ref())
            .filter(|field| !function.is_numeric() || field.is_numeric())
            .cloned()
            .collect();
        TableSchema {
            selected_function: Some(function),
            possible_values,
            selected_value: None,
            ..self.clone()
        }
    }

    /// Wire form sent to the compute service.
    pub fn to_pivot_schema(&self, table_name: &str) -> PivotSchema {
        PivotSchema {
            table_name: table_name.to_string(),
            row_labels: self
                .selected_row_labels
                .iter()
                .map(|field| field.name.clone())
                .collect(),
            column_labels: self
                .selected_column_labels
                .iter()
                .map(|field| field.name.clone())
                .collect(),
            page_label: self.selected_page_label.clone(),
            function: self.selected_function,
            value_field: self.selected_value.clone(),
            filter_field: self.selected_filter_field.clone(),
            filter_value: self.filter_value.clone(),
            sort_field: self.selected_sort_field.clone(),
            sort_order: self.sort_order,
            alias_map: self.alias_map.clone(),
            summary_function: self.summary_function,
        }
    }
}
