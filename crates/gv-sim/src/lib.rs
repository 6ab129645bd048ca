//! gv-sim: the simulation clock and state machine for gridvolt.
//!
//! Provides:
//! - `SimState` and the condvar-backed transition cell callers block on
//! - `SimParams` and effective time-step derivation
//! - The worker thread that compiles, steps the solver, and records scope
//!   samples while the machine is Running

pub mod clock;
pub mod engine;
pub mod error;
pub mod state;

pub use clock::{effective_dt, SimParams, DC_DEFAULT_DT_S};
pub use engine::{CircuitModel, SimShared, SimWorker};
pub use error::{SimError, SimResult};
pub use state::{SimState, StateCell};
