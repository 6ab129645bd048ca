//! gv-components: circuit element library for gridvolt.
//!
//! Provides:
//! - The closed component sum type (connector, power, R, C, L, diode)
//! - Power source waveforms (DC with ramp, sine, trapezoidal square)
//! - The diode dynamic-resistance law with smoothing
//! - Engineering-suffix value parsing and formatting
//!
//! Components here are pure parameters. All mutable solver state (currents,
//! smoothed diode resistance, histories) lives in arenas owned by the solver
//! and simulation crates, indexed by component slot.

pub mod diode;
pub mod error;
pub mod kind;
pub mod power;
pub mod value;

// Re-exports
pub use diode::DiodeLaw;
pub use error::{ComponentError, ComponentResult};
pub use kind::ComponentKind;
pub use power::{PowerSource, Waveform, DC_RAMP_TIME_S};
pub use value::{format_value, parse_value};
