//! gv-app: shared application service layer for gridvolt.
//!
//! One facade for CLI and GUI frontends: topology editing, clock control,
//! read-only snapshots, and script/JSON import-export. Topology commands
//! force the clock into Reset before touching the schematic.

pub mod error;
pub mod export;
pub mod service;

pub use error::{AppError, AppResult};
pub use export::{to_json_lines, write_json_lines};
pub use service::CircuitService;

// The facade's own vocabulary for callers that do not need gv-sim directly
pub use gv_sim::{SimParams, SimState};
