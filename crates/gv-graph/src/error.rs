//! Topology and compilation error types.
//!
//! Everything here is recoverable: the caller discards the partial
//! compilation and the model stays in reset. Invariant violations (a terminal
//! claimed by two nodes) are compiler bugs and panic instead.

use gv_core::{CompId, GridLocation};
use thiserror::Error;

/// Schematic editing and graph compilation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Cell {loc} already holds the maximum number of terminals")]
    CellFull { loc: GridLocation },

    #[error("Location {loc} lies outside the schematic grid")]
    OutOfGrid { loc: GridLocation },

    #[error("No such component: {comp}")]
    NoSuchComponent { comp: CompId },

    #[error("Compilation produced no nodes (add at least one non-wire component)")]
    NoNodes,

    #[error("Expected exactly one ground node, found {count}")]
    GroundCount { count: usize },

    #[error("Power source {comp}: terminal 1 is not on the ground node")]
    PowerNotGrounded { comp: CompId },

    #[error("Power source {comp}: terminal 0 is on the ground node")]
    PowerDrivesGround { comp: CompId },

    #[error("Multiple power sources drive the same node")]
    PowerCollision,
}

pub type GraphResult<T> = Result<T, GraphError>;
