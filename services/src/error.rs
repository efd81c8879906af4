//! FILENAME: services/src/error.rs

use thiserror::Error;

/// Failures surfaced by the external collaborators.
///
/// None of these are retried by the core. Each one idles the loading flag
/// of the round-trip that raised it and attaches its message to the
/// session snapshot; a failed materialization additionally drops any
/// previously materialized result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("pivot computation rejected: {0}")]
    Compute(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}
