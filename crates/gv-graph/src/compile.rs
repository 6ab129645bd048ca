//! Graph compilation: merge terminals into electrical nodes.
//!
//! A node is the maximal set of terminals transitively connected through
//! zero-impedance connectors. Compilation runs whenever the topology changes
//! and the model leaves reset; the result is consumed only by the solver.
//!
//! Traversal is an explicit worklist with a visited set keyed by grid
//! location, so connector cycles terminate and stack depth stays bounded.

use crate::error::{GraphError, GraphResult};
use crate::schematic::Schematic;
use gv_core::{GridLocation, NodeId, TermRef, TermSide};
use std::collections::HashSet;

/// One electrical node: the solver's unit of voltage state.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Non-connector terminals attached to this node.
    pub terminals: Vec<TermRef>,
    /// Grid locations spanned (deduplicated).
    pub locations: Vec<GridLocation>,
    /// True if any spanned location carries the ground mark.
    pub ground: bool,
    /// The one power-source terminal 0 incident on this node, if any.
    pub power_term: Option<TermRef>,
}

/// The compiled node graph. Immutable once built; rebuilt wholesale on every
/// reset, which is why terminals refer to nodes by arena id only.
#[derive(Debug, Clone)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    /// Node assignment per component slot and terminal side. `None` for
    /// connectors and cleared slots.
    term_nodes: Vec<[Option<NodeId>; 2]>,
    ground_node: NodeId,
}

impl NodeGraph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index() as usize]
    }

    pub fn ground_node(&self) -> NodeId {
        self.ground_node
    }

    /// Node a terminal was assigned to during compilation.
    pub fn node_of(&self, term: TermRef) -> Option<NodeId> {
        self.term_nodes
            .get(term.comp.index() as usize)
            .and_then(|sides| sides[term.side.index()])
    }
}

/// Compile the schematic into its node graph.
///
/// Errors are recoverable topology errors; the caller stays in reset and the
/// partial result is discarded. Preconditions violated only by compiler bugs
/// (a terminal claimed twice) panic.
pub fn compile(sch: &Schematic) -> GraphResult<NodeGraph> {
    let mut nodes: Vec<Node> = Vec::new();
    let mut term_nodes: Vec<[Option<NodeId>; 2]> = vec![[None; 2]; sch.slot_count()];

    for placed in sch.components() {
        if placed.kind.is_connector() {
            continue;
        }
        for side in [TermSide::A, TermSide::B] {
            let seed = TermRef::new(placed.id, side);
            if term_nodes[placed.id.index() as usize][side.index()].is_some() {
                continue;
            }
            let id = NodeId::from_index(nodes.len() as u32);
            let node = absorb(sch, id, placed.end(side), &mut term_nodes);
            nodes.push(node);
            assert!(
                term_nodes[seed.comp.index() as usize][seed.side.index()].is_some(),
                "seed terminal not claimed by its own flood fill"
            );
        }
    }

    if nodes.is_empty() {
        return Err(GraphError::NoNodes);
    }

    let ground_node = validate(sch, &nodes, &term_nodes)?;

    Ok(NodeGraph {
        nodes,
        term_nodes,
        ground_node,
    })
}

/// Flood-fill one node starting from a seed location, claiming every
/// non-connector terminal reachable through connectors.
fn absorb(
    sch: &Schematic,
    id: NodeId,
    seed: GridLocation,
    term_nodes: &mut [[Option<NodeId>; 2]],
) -> Node {
    let mut node = Node {
        id,
        terminals: Vec::new(),
        locations: Vec::new(),
        ground: false,
        power_term: None,
    };

    let mut visited: HashSet<GridLocation> = HashSet::new();
    let mut work = vec![seed];

    while let Some(loc) = work.pop() {
        if !visited.insert(loc) {
            continue;
        }
        node.locations.push(loc);
        if sch.is_grounded(loc) {
            node.ground = true;
        }

        for &term in sch.terminals_at(loc) {
            let placed = sch
                .component(term.comp)
                .expect("cell lists a terminal of a cleared slot");
            if placed.kind.is_connector() {
                let other = placed.end(term.side.other());
                if !visited.contains(&other) {
                    work.push(other);
                }
            } else {
                let slot = &mut term_nodes[term.comp.index() as usize][term.side.index()];
                match *slot {
                    Some(owner) if owner == id => {} // same node reached again
                    Some(_) => panic!("terminal claimed by two nodes"),
                    None => {
                        *slot = Some(id);
                        node.terminals.push(term);
                        if placed.kind.is_power() && term.side == TermSide::A {
                            node.power_term = Some(term);
                        }
                    }
                }
            }
        }
    }

    node
}

/// Post-compilation invariants that valid input can still violate.
fn validate(
    sch: &Schematic,
    nodes: &[Node],
    term_nodes: &[[Option<NodeId>; 2]],
) -> GraphResult<NodeId> {
    let grounded: Vec<&Node> = nodes.iter().filter(|n| n.ground).collect();
    if grounded.len() != 1 {
        return Err(GraphError::GroundCount {
            count: grounded.len(),
        });
    }
    let ground_node = grounded[0].id;

    for placed in sch.components() {
        if !placed.kind.is_power() {
            continue;
        }
        let slot = placed.id.index() as usize;
        let t0 = term_nodes[slot][0].expect("power terminal 0 unassigned");
        let t1 = term_nodes[slot][1].expect("power terminal 1 unassigned");
        if t1 != ground_node {
            return Err(GraphError::PowerNotGrounded { comp: placed.id });
        }
        if t0 == ground_node {
            return Err(GraphError::PowerDrivesGround { comp: placed.id });
        }
    }

    // At most one power terminal 0 per non-ground node. `absorb` keeps the
    // last one it saw, so count from the assignments instead.
    for node in nodes {
        if node.id == ground_node {
            continue;
        }
        let power_count = node
            .terminals
            .iter()
            .filter(|t| {
                t.side == TermSide::A
                    && sch
                        .component(t.comp)
                        .is_some_and(|p| p.kind.is_power())
            })
            .count();
        if power_count > 1 {
            return Err(GraphError::PowerCollision);
        }
    }

    Ok(ground_node)
}
