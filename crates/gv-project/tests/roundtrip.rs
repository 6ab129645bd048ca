//! Script round-trips must reproduce an identical node graph.

use gv_core::{TermRef, TermSide};
use gv_graph::{compile, NodeGraph, Schematic};
use gv_project::{read_script, write_script};

/// Two graphs are the same if every terminal maps to the same node index and
/// the ground node matches.
fn assert_same_graph(sch: &Schematic, a: &NodeGraph, b: &NodeGraph) {
    assert_eq!(a.nodes().len(), b.nodes().len());
    assert_eq!(a.ground_node(), b.ground_node());
    for placed in sch.components() {
        if placed.kind.is_connector() {
            continue;
        }
        for side in [TermSide::A, TermSide::B] {
            let term = TermRef::new(placed.id, side);
            assert_eq!(a.node_of(term), b.node_of(term), "terminal {term:?}");
        }
    }
}

#[test]
fn divider_round_trips() {
    let text = "\
power aa ca 12
resistor aa ba 1
resistor ba ca 2
ground ca
";
    let (sch, params) = read_script(text).unwrap();
    let graph = compile(&sch).unwrap();

    let rewritten = write_script(&sch, &params);
    let (sch2, _) = read_script(&rewritten).unwrap();
    let graph2 = compile(&sch2).unwrap();

    assert_same_graph(&sch, &graph, &graph2);
}

#[test]
fn wired_mesh_with_every_kind_round_trips() {
    let text = "\
power aa da 10 square 2k
resistor aa ba 4.7k
capacitor ba ca 100n
inductor ca da 1m 0.25
diode ba da
wire ba bb
resistor bb cb 10k
wire cb da
ground da
set dt 1u
set span 10m
set mode oneshot
set trigger 2.5
";
    let (sch, params) = read_script(text).unwrap();
    let graph = compile(&sch).unwrap();

    let rewritten = write_script(&sch, &params);
    let (sch2, params2) = read_script(&rewritten).unwrap();
    let graph2 = compile(&sch2).unwrap();

    assert_same_graph(&sch, &graph, &graph2);
    assert_eq!(params2.dt_s, Some(1e-6));
    assert_eq!(params2.scope_trigger, Some(2.5));
    assert_eq!(params2.scope_mode, gv_scope::ScopeMode::OneShot);
}
