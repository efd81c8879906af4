//! FILENAME: session/src/lib.rs
//! Wizard session state machine.
//!
//! This crate owns the interactive side of the pivot wizard: the live
//! selection state with its cascade rules, the immutable session
//! snapshot, and the pure transition function that applies commands and
//! emits intents for the collaborator services.
//!
//! Layers:
//! - `schema`: the live selection state and its cascade rules
//! - `command`: commands in, intents out
//! - `state`: the session snapshot and pure transition function
//! - `driver`: synchronous loop running intents against the services

pub mod command;
pub mod driver;
pub mod schema;
pub mod state;

pub use command::{Command, Intent};
pub use driver::SessionDriver;
pub use schema::TableSchema;
pub use state::{reduce, SessionState};
