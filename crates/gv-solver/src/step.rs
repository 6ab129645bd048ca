//! The fixed-point solve for one time step.

use crate::error::{SolverError, SolverResult};
use crate::state::SolverState;
use gv_components::{ComponentKind, DiodeLaw};
use gv_core::{CompId, NodeId, Real, TermRef, TermSide};
use gv_graph::{Node, NodeGraph, Schematic};
use rayon::prelude::*;

/// Default hard cap on fixed-point iterations per step.
pub const MAX_ITERATIONS: usize = 100_000;

/// Relative gap between a diode's smoothed resistance and its target below
/// which the diode counts as settled.
const DIODE_SETTLE_RATIO: Real = 0.01;

/// Solver configuration for one step.
#[derive(Debug, Clone)]
pub struct StepConfig {
    /// Hard cap on fixed-point iterations per step.
    pub max_iterations: usize,
    /// Whether DC sources ramp in over the fixed ramp time.
    pub dc_ramp: bool,
    pub diode_law: DiodeLaw,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            dc_ramp: true,
            diode_law: DiodeLaw::default(),
        }
    }
}

/// Result of one solved step. A capped step still commits; `converged`
/// tells the caller to count it as degraded.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub iterations: usize,
    pub converged: bool,
}

/// Advance the circuit one time step of `dt` seconds starting at `t_now`.
///
/// Iterates voltage, current, and dv/dt passes until every non-ground,
/// non-power node's net incident current is within the tiered stability
/// threshold, or the iteration cap is hit. Either way the step commits:
/// voltage-at-next and current-at-next become the new committed state.
pub fn solve_step(
    sch: &Schematic,
    graph: &NodeGraph,
    state: &mut SolverState,
    t_now: Real,
    dt: Real,
    cfg: &StepConfig,
) -> SolverResult<StepOutcome> {
    if !(dt > 0.0) {
        return Err(SolverError::InvalidTimeStep { dt });
    }
    if state.node_count() != graph.nodes().len() {
        return Err(SolverError::StateMismatch {
            what: "node arena length",
        });
    }
    if state.slot_count() != sch.slot_count() {
        return Err(SolverError::StateMismatch {
            what: "component arena length",
        });
    }

    let t_next = t_now + dt;
    let mut outcome = StepOutcome {
        iterations: 0,
        converged: false,
    };

    while outcome.iterations < cfg.max_iterations {
        outcome.iterations += 1;
        update_voltages(sch, graph, state, t_next, dt, cfg);
        update_currents(sch, graph, state, dt, &cfg.diode_law);

        for (idx, dvdt) in state.dvdt.iter_mut().enumerate() {
            *dvdt = (state.v_next[idx] - state.v_now[idx]) / dt;
        }

        if is_stable(sch, graph, state, &cfg.diode_law) {
            outcome.converged = true;
            break;
        }
    }

    if !outcome.converged {
        tracing::warn!(
            iterations = outcome.iterations,
            "step failed to stabilize, committing degraded result"
        );
    }
    state.commit();
    Ok(outcome)
}

/// One Kirchhoff pass over all nodes, updating `v_next` in place so later
/// nodes see earlier updates within the same iteration.
fn update_voltages(
    sch: &Schematic,
    graph: &NodeGraph,
    state: &mut SolverState,
    t_next: Real,
    dt: Real,
    cfg: &StepConfig,
) {
    for node in graph.nodes() {
        let idx = node.id.index() as usize;

        if node.ground {
            state.v_next[idx] = 0.0;
            continue;
        }
        if let Some(term) = node.power_term {
            let src = sch
                .component(term.comp)
                .and_then(|p| p.kind.as_power().copied())
                .expect("power terminal on a non-power slot");
            state.v_next[idx] = src.value_at(t_next, cfg.dc_ramp);
            continue;
        }

        let mut num = 0.0;
        let mut den = 0.0;
        for &term in &node.terminals {
            let placed = sch.component(term.comp).expect("terminal of cleared slot");
            let other = other_node(graph, term);
            let v_other = state.v_next[other.index() as usize];
            let slot = term.comp.index() as usize;

            match placed.kind {
                ComponentKind::Resistor { ohms } => {
                    num += v_other / ohms.value;
                    den += 1.0 / ohms.value;
                }
                ComponentKind::Capacitor { farads } => {
                    let c = farads.value;
                    num += (c / dt) * state.v_now[idx] + c * state.dvdt[other.index() as usize];
                    den += c / dt;
                }
                ComponentKind::Inductor { henrys, .. } => {
                    let k = dt / henrys.value;
                    let i_now = state.i_now[slot];
                    // Component current runs terminal 0 toward terminal 1,
                    // so the stored current enters this node on side B and
                    // leaves it on side A.
                    num += match term.side {
                        TermSide::A => k * v_other - i_now,
                        TermSide::B => k * v_other + i_now,
                    };
                    den += k;
                }
                ComponentKind::Diode => {
                    let r = state.r_diode[slot];
                    num += v_other / r;
                    den += 1.0 / r;
                }
                // Power terminal 1 sits on the ground node; terminal 0 makes
                // its node a power node. Neither reaches this loop.
                ComponentKind::Power(_) | ComponentKind::Connector => {}
            }
        }

        if den > 0.0 {
            state.v_next[idx] = num / den;
        }
    }
}

/// One pass over all component slots, recomputing `i_next` (and the smoothed
/// diode resistances) from the current voltage iterate. Power sources go
/// last: their current balances everything else on their node.
fn update_currents(
    sch: &Schematic,
    graph: &NodeGraph,
    state: &mut SolverState,
    dt: Real,
    law: &DiodeLaw,
) {
    let SolverState {
        v_now,
        v_next,
        i_now,
        i_next,
        r_diode,
        ..
    } = state;
    let (v_now, v_next, i_now): (&[Real], &[Real], &[Real]) = (v_now, v_next, i_now);

    i_next
        .par_iter_mut()
        .zip(r_diode.par_iter_mut())
        .enumerate()
        .for_each(|(slot, (i, r))| {
            let id = CompId::from_index(slot as u32);
            let Some(placed) = sch.component(id) else {
                *i = 0.0;
                return;
            };

            let dv_of = |v: &[Real]| -> Real {
                let a = graph
                    .node_of(TermRef::new(id, TermSide::A))
                    .expect("unassigned terminal");
                let b = graph
                    .node_of(TermRef::new(id, TermSide::B))
                    .expect("unassigned terminal");
                v[a.index() as usize] - v[b.index() as usize]
            };

            match placed.kind {
                ComponentKind::Resistor { ohms } => {
                    *i = dv_of(v_next) / ohms.value;
                }
                ComponentKind::Capacitor { farads } => {
                    *i = (dv_of(v_next) - dv_of(v_now)) * farads.value / dt;
                }
                ComponentKind::Inductor { henrys, .. } => {
                    *i = i_now[slot] + (dt / henrys.value) * dv_of(v_next);
                }
                ComponentKind::Diode => {
                    *r = law.smooth(*r, dv_of(v_next));
                    *i = dv_of(v_next) / *r;
                }
                ComponentKind::Power(_) | ComponentKind::Connector => {
                    if placed.kind.is_connector() {
                        *i = 0.0;
                    }
                }
            }
        });

    for placed in sch.components() {
        if !placed.kind.is_power() {
            continue;
        }
        let term = TermRef::new(placed.id, TermSide::A);
        let node_id = graph.node_of(term).expect("unassigned power terminal");
        let node = graph.node(node_id);
        // Current balance: the source supplies whatever its node sheds
        // through the other components.
        let (sum, _) = net_currents(node, i_next, Some(placed.id));
        i_next[placed.id.index() as usize] = sum;
    }
}

/// Tiered stability test over all non-ground, non-power nodes. Power and
/// ground nodes balance by construction and are skipped.
///
/// Every diode must also have settled. While a smoothed resistance is still
/// chasing its target, the node residual measures smoothing lag rather than
/// genuine current imbalance, and reading it as convergence would freeze the
/// diode at the wrong operating point.
fn is_stable(sch: &Schematic, graph: &NodeGraph, state: &SolverState, law: &DiodeLaw) -> bool {
    let balanced = graph
        .nodes()
        .par_iter()
        .filter(|n| !n.ground && n.power_term.is_none())
        .all(|node| {
            let (sum, sum_abs) = net_currents(node, &state.i_next, None);
            node_is_stable(sum, sum_abs)
        });
    balanced && diodes_settled(sch, graph, state, law)
}

fn diodes_settled(sch: &Schematic, graph: &NodeGraph, state: &SolverState, law: &DiodeLaw) -> bool {
    sch.components()
        .filter(|placed| matches!(placed.kind, ComponentKind::Diode))
        .all(|placed| {
            let a = graph
                .node_of(TermRef::new(placed.id, TermSide::A))
                .expect("unassigned terminal");
            let b = graph
                .node_of(TermRef::new(placed.id, TermSide::B))
                .expect("unassigned terminal");
            let dv = state.v_next[a.index() as usize] - state.v_next[b.index() as usize];
            let r = state.r_diode[placed.id.index() as usize];
            (law.target_resistance(dv) - r).abs() <= DIODE_SETTLE_RATIO * r
        })
}

/// Net signed and absolute incident current at a node, with currents counted
/// positive into the node. Terminal 0 current leaves the node.
fn net_currents(node: &Node, currents: &[Real], exclude: Option<CompId>) -> (Real, Real) {
    let mut sum = 0.0;
    let mut sum_abs = 0.0;
    for &term in &node.terminals {
        if exclude == Some(term.comp) {
            continue;
        }
        let i = currents[term.comp.index() as usize];
        sum += match term.side {
            TermSide::A => -i,
            TermSide::B => i,
        };
        sum_abs += i.abs();
    }
    (sum, sum_abs)
}

/// The threshold loosens as the absolute current shrinks: floating-point
/// noise around zero current must not read as non-convergence.
fn node_is_stable(sum: Real, sum_abs: Real) -> bool {
    if sum_abs == 0.0 {
        return true;
    }
    let ratio = sum.abs() / sum_abs;
    let tol = if sum_abs >= 1e-3 {
        1e-3
    } else if sum_abs >= 1e-6 {
        1e-2
    } else {
        1e-1
    };
    ratio <= tol
}

/// Dissipated power per component slot at the committed state: `|dV| * I`,
/// sign-flipped for power sources so delivery reads positive.
pub fn component_powers(sch: &Schematic, graph: &NodeGraph, state: &SolverState) -> Vec<Real> {
    let mut powers = vec![0.0; sch.slot_count()];
    for placed in sch.components() {
        if placed.kind.is_connector() {
            continue;
        }
        let slot = placed.id.index() as usize;
        let a = graph
            .node_of(TermRef::new(placed.id, TermSide::A))
            .expect("unassigned terminal");
        let b = graph
            .node_of(TermRef::new(placed.id, TermSide::B))
            .expect("unassigned terminal");
        let dv = state.v_now[a.index() as usize] - state.v_now[b.index() as usize];
        let p = dv.abs() * state.i_now[slot];
        powers[slot] = if placed.kind.is_power() { -p } else { p };
    }
    powers
}

fn other_node(graph: &NodeGraph, term: TermRef) -> NodeId {
    graph
        .node_of(term.opposite())
        .expect("other terminal unassigned")
}
