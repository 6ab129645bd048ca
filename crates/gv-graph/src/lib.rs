//! gv-graph: schematic topology and graph compilation for gridvolt.
//!
//! Provides:
//! - The `Schematic` aggregate: grid cells, component registry, ground mark
//! - Ground flood-fill through connectors
//! - The graph compiler that merges terminals into electrical nodes
//!
//! # Example
//!
//! ```
//! use gv_components::{ComponentKind, PowerSource};
//! use gv_core::{grid::GridLocation, units::{ohm, volt}};
//! use gv_graph::{compile, Schematic};
//!
//! let mut sch = Schematic::new();
//! let a = GridLocation::parse_label("aa").unwrap();
//! let b = GridLocation::parse_label("ba").unwrap();
//! sch.add(ComponentKind::Power(PowerSource::dc(volt(12.0))), a, b).unwrap();
//! sch.add(ComponentKind::Resistor { ohms: ohm(100.0) }, a, b).unwrap();
//! sch.set_ground(Some(b)).unwrap();
//! sch.mark_ground();
//!
//! let graph = compile(&sch).unwrap();
//! assert_eq!(graph.nodes().len(), 2);
//! ```

pub mod compile;
pub mod error;
pub mod schematic;

// Re-exports for ergonomics
pub use compile::{compile, Node, NodeGraph};
pub use error::GraphError;
pub use schematic::{PlacedComponent, Schematic, CELL_TERMINAL_MAX};
