//! Error types for simulation control.

use thiserror::Error;

/// Errors surfaced by the simulation clock.
#[derive(Error, Debug)]
pub enum SimError {
    /// No explicit time step and none derivable from the circuit.
    #[error("No usable time step: {why}")]
    NoTimeStep { why: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Graph compilation failed: {0}")]
    Compile(#[from] gv_graph::GraphError),

    #[error("Solver failed: {0}")]
    Solver(#[from] gv_solver::SolverError),
}

pub type SimResult<T> = Result<T, SimError>;
