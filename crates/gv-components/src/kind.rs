//! The closed component sum type.

use crate::power::PowerSource;
use gv_core::units::{Capacitance, Current, Inductance, Resistance};

/// A typed circuit element. Every component has exactly two terminals.
///
/// The variant set is closed: the solver matches on it exhaustively, so a
/// tagged enum fits better here than an open trait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentKind {
    /// Zero-impedance wire. Eliminated during graph compilation.
    Connector,
    /// DC or periodic voltage source. Terminal 0 is the driven side.
    Power(PowerSource),
    Resistor { ohms: Resistance },
    Capacitor { farads: Capacitance },
    Inductor {
        henrys: Inductance,
        /// Current flowing at t = 0, terminal 0 toward terminal 1.
        initial_current: Current,
    },
    /// Nonlinear; carries no static value. See [`crate::DiodeLaw`].
    Diode,
}

impl ComponentKind {
    pub fn is_connector(&self) -> bool {
        matches!(self, ComponentKind::Connector)
    }

    pub fn is_power(&self) -> bool {
        matches!(self, ComponentKind::Power(_))
    }

    pub fn as_power(&self) -> Option<&PowerSource> {
        match self {
            ComponentKind::Power(src) => Some(src),
            _ => None,
        }
    }

    /// Short lowercase name used in scripts and telemetry.
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Connector => "wire",
            ComponentKind::Power(_) => "power",
            ComponentKind::Resistor { .. } => "resistor",
            ComponentKind::Capacitor { .. } => "capacitor",
            ComponentKind::Inductor { .. } => "inductor",
            ComponentKind::Diode => "diode",
        }
    }
}
