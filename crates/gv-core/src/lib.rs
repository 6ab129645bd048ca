//! gv-core: stable foundation for gridvolt.
//!
//! Contains:
//! - units (uom SI electrical types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for graph/model objects)
//! - grid (bounded grid locations and their display labels)
//! - error (shared error types)

pub mod error;
pub mod grid;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{GvError, GvResult};
pub use grid::{GridLocation, GRID_AXIS_MAX};
pub use ids::*;
pub use numeric::*;
pub use units::*;
