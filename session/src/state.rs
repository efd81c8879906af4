//! FILENAME: session/src/state.rs
//! Session snapshot and the pure transition function.
//!
//! One immutable `SessionState` at a time: every command produces a new
//! snapshot, so a half-applied transition is never observable. The
//! selection cascade lives in `TableSchema`; this module owns the outer
//! invalidation rule (a command either leaves the materialized `PageSet`
//! untouched or resets it to its empty default) and the revision tag
//! that rejects materialization replies computed against an older schema.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use pivot_engine::{assemble_pages, PageSet, RawReport};
use services::SchemaBundle;

use crate::command::{Command, Intent};
use crate::schema::TableSchema;

// ============================================================================
// SNAPSHOT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Persisted schema id, present after a save or a shared-schema load.
    pub schema_id: Option<String>,

    pub source_name: String,
    pub username: String,
    pub password: String,
    pub connected: bool,

    pub selected_table: String,
    pub table_list: Vec<String>,
    pub raw_report: RawReport,

    pub schema: TableSchema,

    /// The materialized result. Reset wholesale by every command that
    /// could make it stale; never partially mutated.
    pub pivot_tables: PageSet,

    pub info_message: String,
    pub error_message: String,
    pub printable_view: bool,

    // One loading flag per collaborator round-trip.
    pub connection_loading: bool,
    pub table_list_loading: bool,
    pub raw_report_loading: bool,
    pub pivot_loading: bool,
    pub schema_io_loading: bool,

    /// Schema state a materialization run is computed against. Bumped by
    /// every command that invalidates the materialized result, so a
    /// reply finishing out of order can be recognized and discarded.
    pub revision: u64,
}

impl SessionState {
    fn bundle(&self) -> SchemaBundle {
        SchemaBundle {
            schema_id: self.schema_id.clone(),
            schema_name: self.schema.name.clone(),
            pivot_schema: self.schema.to_pivot_schema(&self.selected_table),
            source_url: self.source_name.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Installs a schema mutation that makes any materialized result stale.
fn with_stale_result(state: &SessionState, schema: TableSchema) -> SessionState {
    SessionState {
        schema,
        pivot_tables: PageSet::default(),
        revision: state.revision + 1,
        ..state.clone()
    }
}

fn with_schema(state: &SessionState, schema: TableSchema) -> SessionState {
    SessionState {
        schema,
        ..state.clone()
    }
}

/// The pure state-transition function. Applies one command to the current
/// snapshot and returns the next snapshot plus the effect to run, if any.
pub fn reduce(state: &SessionState, command: Command) -> (SessionState, Option<Intent>) {
    match command {
        // ------------------------------------------------------------------
        // Connection & catalog
        // ------------------------------------------------------------------
        Command::SourceNameChanged(value) => (
            SessionState {
                source_name: value,
                ..state.clone()
            },
            None,
        ),
        Command::UsernameChanged(value) => (
            SessionState {
                username: value,
                ..state.clone()
            },
            None,
        ),
        Command::PasswordChanged(value) => (
            SessionState {
                password: value,
                ..state.clone()
            },
            None,
        ),
        Command::ConnectRequested => (
            SessionState {
                connection_loading: true,
                ..state.clone()
            },
            Some(Intent::Connect),
        ),
        Command::ConnectSucceeded => (
            SessionState {
                connection_loading: false,
                connected: true,
                error_message: String::new(),
                ..state.clone()
            },
            None,
        ),
        Command::ConnectFailed(message) => (
            SessionState {
                connection_loading: false,
                connected: false,
                error_message: message,
                ..state.clone()
            },
            None,
        ),
        Command::TableListRequested => (
            SessionState {
                table_list_loading: true,
                ..state.clone()
            },
            Some(Intent::FetchTableList),
        ),
        Command::TableListLoaded(tables) => (
            SessionState {
                table_list_loading: false,
                table_list: tables,
                error_message: String::new(),
                ..state.clone()
            },
            None,
        ),
        Command::TableListFailed(message) => (
            SessionState {
                table_list_loading: false,
                error_message: message,
                ..state.clone()
            },
            None,
        ),
        Command::TableSelected(table) => (
            SessionState {
                selected_table: table,
                raw_report: RawReport::default(),
                ..state.clone()
            },
            None,
        ),
        Command::RawReportRequested => (
            SessionState {
                raw_report_loading: true,
                ..state.clone()
            },
            Some(Intent::FetchRawReport {
                table: state.selected_table.clone(),
            }),
        ),
        Command::RawReportLoaded(report) => {
            debug!(
                "raw report loaded: {} columns, {} rows",
                report.columns.len(),
                report.rows.len()
            );
            (
                SessionState {
                    raw_report_loading: false,
                    schema: TableSchema::for_columns(report.columns.clone()),
                    raw_report: report,
                    pivot_tables: PageSet::default(),
                    error_message: String::new(),
                    revision: state.revision + 1,
                    ..state.clone()
                },
                None,
            )
        }
        Command::RawReportFailed(message) => (
            SessionState {
                raw_report_loading: false,
                raw_report: RawReport::default(),
                pivot_tables: PageSet::default(),
                error_message: message,
                revision: state.revision + 1,
                ..state.clone()
            },
            None,
        ),
        Command::Disconnect => (
            SessionState {
                source_name: state.source_name.clone(),
                username: state.username.clone(),
                ..SessionState::default()
            },
            None,
        ),

        // ------------------------------------------------------------------
        // Schema wizard
        // ------------------------------------------------------------------
        Command::RowLabelsSelected(names) => (
            with_stale_result(state, state.schema.with_row_labels(&names)),
            None,
        ),
        Command::ColumnLabelsSelected(names) => (
            with_stale_result(state, state.schema.with_column_labels(&names)),
            None,
        ),
        Command::PageLabelSelected(label) => (
            with_stale_result(state, state.schema.with_page_label(label)),
            None,
        ),
        Command::FunctionSelected(function) => (
            with_stale_result(state, state.schema.with_function(function)),
            None,
        ),
        Command::ValueSelected(value) => (
            with_stale_result(
                state,
                TableSchema {
                    selected_value: Some(value),
                    ..state.schema.clone()
                },
            ),
            None,
        ),
        Command::SortFieldSelected(field) => (
            with_stale_result(
                state,
                TableSchema {
                    selected_sort_field: field,
                    ..state.schema.clone()
                },
            ),
            None,
        ),
        Command::SortOrderSelected(order) => (
            with_stale_result(
                state,
                TableSchema {
                    sort_order: order,
                    ..state.schema.clone()
                },
            ),
            None,
        ),
        Command::FilterFieldSelected(field) => (
            with_stale_result(
                state,
                TableSchema {
                    selected_filter_field: field,
                    ..state.schema.clone()
                },
            ),
            None,
        ),
        Command::FilterValueChanged(value) => (
            with_stale_result(
                state,
                TableSchema {
                    filter_value: Some(value),
                    ..state.schema.clone()
                },
            ),
            None,
        ),
        Command::AliasChanged { field, alias } => {
            let mut schema = state.schema.clone();
            schema.alias_map.insert(field, alias);
            (with_schema(state, schema), None)
        }
        Command::SummaryFunctionSelected(function) => (
            with_schema(
                state,
                TableSchema {
                    summary_function: Some(function),
                    ..state.schema.clone()
                },
            ),
            None,
        ),
        Command::SchemaNameChanged(name) => (
            with_schema(
                state,
                TableSchema {
                    name,
                    ..state.schema.clone()
                },
            ),
            None,
        ),
        Command::SchemaReset => (with_stale_result(state, state.schema.reset()), None),
        Command::ClearSession => (SessionState::default(), None),

        // ------------------------------------------------------------------
        // Materialization & navigation
        // ------------------------------------------------------------------
        Command::MaterializeRequested => (
            SessionState {
                pivot_loading: true,
                ..state.clone()
            },
            Some(Intent::Materialize {
                revision: state.revision,
                schema: state.schema.to_pivot_schema(&state.selected_table),
            }),
        ),
        Command::MaterializeApplied { revision, response } => {
            if revision != state.revision {
                warn!(
                    "discarding stale materialization (revision {revision}, current {})",
                    state.revision
                );
                return (state.clone(), None);
            }
            match assemble_pages(&response) {
                Ok(pages) => {
                    debug!("materialized {} page(s)", pages.pages.len());
                    (
                        SessionState {
                            pivot_loading: false,
                            pivot_tables: pages,
                            error_message: String::new(),
                            info_message: String::new(),
                            ..state.clone()
                        },
                        None,
                    )
                }
                Err(error) => (
                    SessionState {
                        pivot_loading: false,
                        pivot_tables: PageSet::default(),
                        error_message: error.to_string(),
                        ..state.clone()
                    },
                    None,
                ),
            }
        }
        Command::MaterializeFailed { revision, message } => {
            if revision != state.revision {
                warn!(
                    "discarding stale materialization failure (revision {revision}, current {})",
                    state.revision
                );
                return (state.clone(), None);
            }
            (
                SessionState {
                    pivot_loading: false,
                    pivot_tables: PageSet::default(),
                    error_message: message,
                    ..state.clone()
                },
                None,
            )
        }
        Command::PageChanged(page) => {
            if page < state.pivot_tables.pages.len() {
                let mut pivot_tables = state.pivot_tables.clone();
                pivot_tables.selected = page as i32;
                (
                    SessionState {
                        pivot_tables,
                        ..state.clone()
                    },
                    None,
                )
            } else {
                (state.clone(), None)
            }
        }
        Command::PrintableViewToggled(value) => (
            SessionState {
                printable_view: value,
                ..state.clone()
            },
            None,
        ),

        // ------------------------------------------------------------------
        // Schema persistence
        // ------------------------------------------------------------------
        Command::SchemaSaveRequested => (
            SessionState {
                schema_io_loading: true,
                ..state.clone()
            },
            Some(Intent::SaveSchema(state.bundle())),
        ),
        Command::SchemaSaved(id) => (
            SessionState {
                schema_io_loading: false,
                schema_id: Some(id),
                info_message: "Schema saved!".to_string(),
                error_message: String::new(),
                ..state.clone()
            },
            None,
        ),
        Command::SchemaSaveFailed(message) => (
            SessionState {
                schema_io_loading: false,
                info_message: String::new(),
                error_message: message,
                ..state.clone()
            },
            None,
        ),
        Command::SchemaFetchRequested(id) => (
            SessionState {
                schema_io_loading: true,
                ..state.clone()
            },
            Some(Intent::LoadSchema { id }),
        ),
        Command::SchemaLoaded(bundle) => (
            SessionState {
                schema_id: bundle.schema_id,
                source_name: bundle.source_url,
                username: bundle.username,
                password: bundle.password,
                ..SessionState::default()
            },
            None,
        ),
        Command::SchemaFetchFailed(message) => (
            SessionState {
                schema_io_loading: false,
                info_message: String::new(),
                error_message: message,
                ..state.clone()
            },
            None,
        ),
        Command::AliasMapRestored(alias_map) => {
            let mut schema = state.schema.clone();
            schema.alias_map = alias_map;
            (with_schema(state, schema), None)
        }
    }
}
