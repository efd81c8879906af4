//! FILENAME: session/src/command.rs
//! Commands and intents of the wizard state machine.
//!
//! A `Command` is everything that can happen to a session: user edits,
//! service outcomes, navigation. The transition function consumes one
//! command and may emit one `Intent`, an effect for the driver to run
//! against the collaborator services. The state machine itself never
//! performs I/O.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pivot_engine::{AggregationType, PivotResponse, PivotSchema, RawReport, SortOrder};
use services::SchemaBundle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // ------------------------------------------------------------------
    // Connection & catalog
    // ------------------------------------------------------------------
    SourceNameChanged(String),
    UsernameChanged(String),
    PasswordChanged(String),
    ConnectRequested,
    ConnectSucceeded,
    ConnectFailed(String),
    TableListRequested,
    TableListLoaded(Vec<String>),
    TableListFailed(String),
    TableSelected(String),
    RawReportRequested,
    RawReportLoaded(RawReport),
    RawReportFailed(String),
    Disconnect,

    // ------------------------------------------------------------------
    // Schema wizard
    // ------------------------------------------------------------------
    RowLabelsSelected(Vec<String>),
    ColumnLabelsSelected(Vec<String>),
    PageLabelSelected(Option<String>),
    FunctionSelected(AggregationType),
    ValueSelected(String),
    SortFieldSelected(Option<String>),
    SortOrderSelected(SortOrder),
    FilterFieldSelected(Option<String>),
    FilterValueChanged(String),
    AliasChanged { field: String, alias: String },
    SummaryFunctionSelected(AggregationType),
    SchemaNameChanged(String),
    SchemaReset,
    ClearSession,

    // ------------------------------------------------------------------
    // Materialization & navigation
    // ------------------------------------------------------------------
    MaterializeRequested,
    /// Compute reply for the run tagged with `revision`. Replies whose
    /// tag no longer matches the current schema revision are discarded.
    MaterializeApplied { revision: u64, response: PivotResponse },
    MaterializeFailed { revision: u64, message: String },
    PageChanged(usize),
    PrintableViewToggled(bool),

    // ------------------------------------------------------------------
    // Schema persistence
    // ------------------------------------------------------------------
    SchemaSaveRequested,
    SchemaSaved(String),
    SchemaSaveFailed(String),
    SchemaFetchRequested(String),
    SchemaLoaded(SchemaBundle),
    SchemaFetchFailed(String),
    AliasMapRestored(HashMap<String, String>),
}

/// Effects the state machine asks the driver to run. Each intent maps to
/// exactly one collaborator round-trip; its outcome comes back in as a
/// follow-up `Command`.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Connect,
    FetchTableList,
    FetchRawReport { table: String },
    /// Materialize the given wire schema. `revision` identifies the
    /// schema state the run was requested against.
    Materialize { revision: u64, schema: PivotSchema },
    SaveSchema(SchemaBundle),
    LoadSchema { id: String },
}
