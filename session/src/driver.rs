//! FILENAME: session/src/driver.rs
//! Synchronous integration loop between the state machine and the
//! collaborator services.
//!
//! `dispatch` applies one command, then runs whatever intent the
//! transition emitted and feeds the outcome back in as a follow-up
//! command. Service errors become the matching `*Failed` command, so the
//! snapshot always reflects the failure instead of unwinding. The engine
//! itself never suspends: every round-trip completes before `dispatch`
//! returns.

use log::{debug, warn};

use services::{
    DataSource, PivotComputeService, RawReportService, SchemaBundle, SchemaPersistence,
    TableCatalog,
};

use crate::command::{Command, Intent};
use crate::state::{reduce, SessionState};

pub struct SessionDriver<C, R, P, S> {
    state: SessionState,
    catalog: C,
    reports: R,
    compute: P,
    persistence: S,
}

impl<C, R, P, S> SessionDriver<C, R, P, S>
where
    C: TableCatalog,
    R: RawReportService,
    P: PivotComputeService,
    S: SchemaPersistence,
{
    pub fn new(catalog: C, reports: R, compute: P, persistence: S) -> Self {
        SessionDriver {
            state: SessionState::default(),
            catalog,
            reports,
            compute,
            persistence,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn source(&self) -> DataSource {
        DataSource {
            url: self.state.source_name.clone(),
            username: self.state.username.clone(),
            password: self.state.password.clone(),
        }
    }

    /// Applies one command and runs any intent it emitted.
    pub fn dispatch(&mut self, command: Command) {
        let (next, intent) = reduce(&self.state, command);
        self.state = next;
        if let Some(intent) = intent {
            self.run(intent);
        }
    }

    fn run(&mut self, intent: Intent) {
        match intent {
            Intent::Connect => {
                debug!("connecting to {}", self.state.source_name);
                let command = match self.catalog.check_access(&self.source()) {
                    Ok(()) => Command::ConnectSucceeded,
                    Err(error) => Command::ConnectFailed(error.to_string()),
                };
                self.dispatch(command);
            }
            Intent::FetchTableList => {
                let command = match self.catalog.list_tables(&self.source()) {
                    Ok(tables) => Command::TableListLoaded(tables),
                    Err(error) => Command::TableListFailed(error.to_string()),
                };
                self.dispatch(command);
            }
            Intent::FetchRawReport { table } => {
                let command = match self.reports.raw_report(&table, &self.source()) {
                    Ok(report) => Command::RawReportLoaded(report),
                    Err(error) => Command::RawReportFailed(error.to_string()),
                };
                self.dispatch(command);
            }
            Intent::Materialize { revision, schema } => {
                let command = match self.compute.compute_pivot(&schema, &self.source()) {
                    Ok(response) => Command::MaterializeApplied { revision, response },
                    Err(error) => Command::MaterializeFailed {
                        revision,
                        message: error.to_string(),
                    },
                };
                self.dispatch(command);
            }
            Intent::SaveSchema(bundle) => {
                let command = match self.persistence.save(&bundle) {
                    Ok(id) => Command::SchemaSaved(id),
                    Err(error) => Command::SchemaSaveFailed(error.to_string()),
                };
                self.dispatch(command);
            }
            Intent::LoadSchema { id } => match self.persistence.load(&id) {
                Ok(bundle) => self.restore(bundle),
                Err(error) => self.dispatch(Command::SchemaFetchFailed(error.to_string())),
            },
        }
    }

    /// Loads a shared schema by id and replays the wizard against it.
    pub fn restore_schema(&mut self, id: &str) {
        self.dispatch(Command::SchemaFetchRequested(id.to_string()));
    }

    /// Replays the wizard for a loaded bundle step by step, exactly as a
    /// user would drive it: connect, refetch the catalog and report, then
    /// every selection in wizard order, then materialize. Stops at the
    /// first step that leaves an error behind; a partial replay is not
    /// resumed.
    fn restore(&mut self, bundle: SchemaBundle) {
        let schema = bundle.pivot_schema.clone();
        let name = bundle.schema_name.clone();
        self.dispatch(Command::SchemaLoaded(bundle));

        let mut steps = vec![
            Command::ConnectRequested,
            Command::TableListRequested,
            Command::TableSelected(schema.table_name.clone()),
            Command::RawReportRequested,
            Command::RowLabelsSelected(schema.row_labels.clone()),
            Command::ColumnLabelsSelected(schema.column_labels.clone()),
            Command::PageLabelSelected(schema.page_label.clone()),
            Command::FilterFieldSelected(schema.filter_field.clone()),
        ];
        if let Some(value) = schema.filter_value.clone() {
            steps.push(Command::FilterValueChanged(value));
        }
        steps.push(Command::SortFieldSelected(schema.sort_field.clone()));
        steps.push(Command::SortOrderSelected(schema.sort_order));
        if let Some(function) = schema.function {
            steps.push(Command::FunctionSelected(function));
        }
        if let Some(value) = schema.value_field.clone() {
            steps.push(Command::ValueSelected(value));
        }
        if let Some(function) = schema.summary_function {
            steps.push(Command::SummaryFunctionSelected(function));
        }
        steps.push(Command::AliasMapRestored(schema.alias_map.clone()));
        steps.push(Command::SchemaNameChanged(name));
        steps.push(Command::MaterializeRequested);

        for step in steps {
            self.dispatch(step);
            if !self.state.error_message.is_empty() {
                warn!("wizard replay aborted: {}", self.state.error_message);
                return;
            }
        }
    }
}
