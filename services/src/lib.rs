//! FILENAME: services/src/lib.rs
//! Collaborator contracts for the pivot wizard.
//!
//! The engine performs no I/O itself; these traits are the seams where a
//! transport layer plugs in. All four are invoked only by the session
//! driver, at state-machine trigger points: the state machine emits
//! intents and never touches a service directly.

use serde::{Deserialize, Serialize};

use pivot_engine::{PivotResponse, PivotSchema, RawReport};

pub mod error;

pub use error::ServiceError;

// ============================================================================
// IDENTITY & BUNDLES
// ============================================================================

/// Connection identity for one data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub url: String,
    pub username: String,
    pub password: String,
}

/// The unit of schema persistence and sharing: the pivot request plus
/// everything needed to replay it against its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaBundle {
    pub schema_id: Option<String>,
    pub schema_name: String,
    pub pivot_schema: PivotSchema,
    pub source_url: String,
    pub username: String,
    pub password: String,
}

// ============================================================================
// CONTRACTS
// ============================================================================

/// Catalog of tables available at a data source.
pub trait TableCatalog {
    /// Verifies the credentials can reach the source at all.
    fn check_access(&self, source: &DataSource) -> Result<(), ServiceError>;

    fn list_tables(&self, source: &DataSource) -> Result<Vec<String>, ServiceError>;
}

/// Fetches a table's column list and ungrouped rows.
pub trait RawReportService {
    fn raw_report(&self, table: &str, source: &DataSource) -> Result<RawReport, ServiceError>;
}

/// Runs the grouping and aggregation for a schema upstream and returns
/// the already-aggregated reply consumed by `pivot_engine::assemble_pages`.
pub trait PivotComputeService {
    fn compute_pivot(
        &self,
        schema: &PivotSchema,
        source: &DataSource,
    ) -> Result<PivotResponse, ServiceError>;
}

/// Saves and loads shareable schema bundles.
pub trait SchemaPersistence {
    /// Returns the id the bundle was stored under.
    fn save(&self, bundle: &SchemaBundle) -> Result<String, ServiceError>;

    fn load(&self, id: &str) -> Result<SchemaBundle, ServiceError>;
}
