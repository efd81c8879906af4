//! FILENAME: pivot-engine/src/lib.rs
//! Pivot materialization engine.
//!
//! Takes the already-aggregated reply of a pivot compute service and
//! re-assembles it into dense, addressable, paginated grids with
//! per-level subtotal overlays. No aggregation happens in this crate.
//!
//! Layers:
//! - `definition`: serializable configuration (what the pivot IS)
//! - `index`: dense ordinals for observed label values (HOW we address)
//! - `materialize`: the assembly algorithm (HOW we calculate)
//! - `view`: renderable pages (WHAT we display)

pub mod definition;
pub mod index;
pub mod materialize;
pub mod value;
pub mod view;

pub use definition::*;
pub use index::*;
pub use materialize::{assemble_pages, Axis, MaterializeError, PivotResponse, SummaryTuple};
pub use value::*;
pub use view::*;
