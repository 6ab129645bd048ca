//! gv-scope: telemetry capture for gridvolt.
//!
//! Contains:
//! - window (windowed moving average + time-bucketed aggregator)
//! - history (lock-free min/max trace buffers for the scope display)
//! - types (serde snapshot records for export)

pub mod history;
pub mod types;
pub mod window;

pub use history::{ScopeHistory, ScopeMode, TraceSlot, SCOPE_SLOTS};
pub use types::{ComponentSample, NodeSample, StepRecord};
pub use window::{TimedAverage, WindowedAverage};
