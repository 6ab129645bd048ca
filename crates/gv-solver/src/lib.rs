//! gv-solver: per-time-step nodal solver for gridvolt.
//!
//! Each step is a fixed-point iteration over the compiled node graph:
//! voltages from Kirchhoff's current law as a weighted average, currents from
//! the element laws, diode resistances smoothed between iterations, until
//! every node's net incident current is within a tiered threshold of zero.
//!
//! Non-convergence is degraded, not fatal: a step that hits the iteration cap
//! is committed anyway and counted.

pub mod error;
pub mod state;
pub mod step;

pub use error::{SolverError, SolverResult};
pub use state::SolverState;
pub use step::{component_powers, solve_step, StepConfig, StepOutcome, MAX_ITERATIONS};
