//! Error types for solver operations.

use thiserror::Error;

/// Errors that can occur while setting up or running a solve step.
///
/// Numerical non-convergence is intentionally absent: a capped step is
/// reported through [`crate::StepOutcome::converged`], not as an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Solver state does not match the compiled graph: {what}")]
    StateMismatch { what: &'static str },

    #[error("Time step must be positive, got {dt}")]
    InvalidTimeStep { dt: f64 },
}

pub type SolverResult<T> = Result<T, SolverError>;
