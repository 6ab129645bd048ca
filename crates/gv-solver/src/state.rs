//! Arena solver state, parallel to the node graph and component registry.

use gv_components::{ComponentKind, DiodeLaw};
use gv_core::Real;
use gv_graph::{NodeGraph, Schematic};

/// All mutable per-step state: per-node voltages and per-component currents.
///
/// Rebuilt from the schematic and node graph on every reset; vectors are
/// indexed by node id and component slot respectively.
#[derive(Debug, Clone, Default)]
pub struct SolverState {
    /// Node voltage at the last committed step.
    pub v_now: Vec<Real>,
    /// Node voltage being solved for.
    pub v_next: Vec<Real>,
    /// Rate of node voltage change at the current iterate.
    pub dvdt: Vec<Real>,
    /// Component current at the last committed step (terminal 0 toward 1).
    pub i_now: Vec<Real>,
    /// Component current being solved for.
    pub i_next: Vec<Real>,
    /// Smoothed dynamic resistance per diode slot (unused entries stay 0).
    pub r_diode: Vec<Real>,
}

impl SolverState {
    /// Fresh state for a compiled graph: voltages and currents zeroed,
    /// inductors seeded with their initial current, diodes with the
    /// zero-bias resistance.
    pub fn for_graph(sch: &Schematic, graph: &NodeGraph, law: &DiodeLaw) -> Self {
        let nodes = graph.nodes().len();
        let slots = sch.slot_count();
        let mut state = Self {
            v_now: vec![0.0; nodes],
            v_next: vec![0.0; nodes],
            dvdt: vec![0.0; nodes],
            i_now: vec![0.0; slots],
            i_next: vec![0.0; slots],
            r_diode: vec![0.0; slots],
        };
        for placed in sch.components() {
            let slot = placed.id.index() as usize;
            match placed.kind {
                ComponentKind::Inductor {
                    initial_current, ..
                } => {
                    state.i_now[slot] = initial_current.value;
                    state.i_next[slot] = initial_current.value;
                }
                ComponentKind::Diode => {
                    state.r_diode[slot] = law.initial_resistance();
                }
                _ => {}
            }
        }
        state
    }

    pub fn node_count(&self) -> usize {
        self.v_now.len()
    }

    pub fn slot_count(&self) -> usize {
        self.i_now.len()
    }

    /// Commit the solved step: next becomes now.
    pub fn commit(&mut self) {
        self.v_now.copy_from_slice(&self.v_next);
        self.i_now.copy_from_slice(&self.i_next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_components::PowerSource;
    use gv_core::units::{amp, henry, ohm, volt};
    use gv_core::GridLocation;
    use gv_graph::compile;

    #[test]
    fn inductor_initial_current_is_seeded() {
        let mut sch = Schematic::new();
        let a = GridLocation::parse_label("aa").unwrap();
        let b = GridLocation::parse_label("ba").unwrap();
        sch.add(
            ComponentKind::Power(PowerSource::dc(volt(1.0))),
            a,
            b,
        )
        .unwrap();
        let ind = sch
            .add(
                ComponentKind::Inductor {
                    henrys: henry(1e-3),
                    initial_current: amp(0.5),
                },
                a,
                b,
            )
            .unwrap();
        sch.add(ComponentKind::Resistor { ohms: ohm(1.0) }, a, b)
            .unwrap();
        sch.set_ground(Some(b)).unwrap();
        sch.mark_ground();

        let graph = compile(&sch).unwrap();
        let state = SolverState::for_graph(&sch, &graph, &DiodeLaw::default());
        assert_eq!(state.i_now[ind.index() as usize], 0.5);
        assert_eq!(state.node_count(), graph.nodes().len());
        assert!(state.v_now.iter().all(|&v| v == 0.0));
    }
}
