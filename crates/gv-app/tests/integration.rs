//! Facade-level tests: the full edit-run-query cycle.

use std::time::{Duration, Instant};

use gv_app::CircuitService;
use gv_components::{ComponentKind, PowerSource};
use gv_core::units::{ohm, volt};
use gv_core::{GridLocation, TermSide};
use gv_sim::SimState;

fn loc(label: &str) -> GridLocation {
    GridLocation::parse_label(label).unwrap()
}

fn wait_until(pred: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !pred() {
        assert!(Instant::now() < deadline, "timed out waiting on the service");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn build_divider(svc: &CircuitService) {
    svc.add_component(
        ComponentKind::Power(PowerSource::dc(volt(12.0))),
        loc("aa"),
        loc("ca"),
    )
    .unwrap();
    svc.add_component(ComponentKind::Resistor { ohms: ohm(1.0) }, loc("aa"), loc("ba"))
        .unwrap();
    svc.add_component(ComponentKind::Resistor { ohms: ohm(2.0) }, loc("ba"), loc("ca"))
        .unwrap();
    svc.set_ground(Some(loc("ca"))).unwrap();
    svc.update_params(|p| {
        p.dt_s = Some(1e-3);
        p.dc_ramp = false;
    });
}

#[test]
fn divider_runs_and_reports_the_kirchhoff_solution() {
    let svc = CircuitService::new();
    build_divider(&svc);

    svc.step(50).unwrap();
    wait_until(|| svc.state() == SimState::Stopped);

    let nodes = svc.node_samples();
    assert_eq!(nodes.len(), 3);
    let comps = svc.component_samples();
    assert_eq!(comps.len(), 3);

    // Midpoint of the divider sits at 8V
    let r1 = comps.iter().find(|c| c.component_id == 1).unwrap();
    let mid = svc
        .node_of(gv_core::CompId::from_index(1), TermSide::B)
        .unwrap();
    let v_mid = nodes
        .iter()
        .find(|n| n.node_id == mid)
        .unwrap()
        .voltage_v;
    assert!((v_mid - 8.0).abs() < 1e-3, "v_mid = {v_mid}");
    assert!((r1.current_a - 4.0).abs() < 1e-3);
    // Source delivers what the resistors burn
    let power = comps.iter().find(|c| c.kind == "power").unwrap();
    assert!((power.power_w - 48.0).abs() < 0.1, "p = {}", power.power_w);
    assert_eq!(svc.failed_steps(), 0);

    let record = svc.snapshot().unwrap();
    assert_eq!(record.nodes.len(), 3);
    assert!(record.sim_time_s > 0.0);
    let json = gv_app::to_json_lines(std::slice::from_ref(&record)).unwrap();
    assert!(json.contains("\"voltage_v\""));
}

#[test]
fn topology_edit_forces_reset() {
    let svc = CircuitService::new();
    build_divider(&svc);
    svc.update_params(|p| p.run_duration_s = None);

    svc.run().unwrap();
    assert_eq!(svc.state(), SimState::Running);
    std::thread::sleep(Duration::from_millis(10));

    // Adding while running must land the clock in Reset before the add
    svc.add_component(
        ComponentKind::Resistor { ohms: ohm(5.0) },
        loc("ba"),
        loc("ca"),
    )
    .unwrap();
    assert_eq!(svc.state(), SimState::Reset);
    assert_eq!(svc.sim_time_s(), 0.0);
    assert!(svc.node_samples().is_empty());
}

#[test]
fn stop_and_continue_preserve_time() {
    let svc = CircuitService::new();
    build_divider(&svc);

    svc.run().unwrap();
    wait_until(|| svc.sim_time_s() > 5e-3);
    svc.stop().unwrap();
    let t_stop = svc.sim_time_s();
    assert_eq!(svc.state(), SimState::Stopped);

    svc.continue_run().unwrap();
    wait_until(|| svc.sim_time_s() > t_stop);
    svc.stop().unwrap();
}

#[test]
fn stepping_a_running_clock_is_rejected() {
    let svc = CircuitService::new();
    build_divider(&svc);
    svc.update_params(|p| p.run_duration_s = None);

    svc.run().unwrap();
    assert_eq!(svc.state(), SimState::Running);

    // A silent no-op here would leave the caller believing 5 more steps
    // were queued
    let err = svc.step(5).unwrap_err();
    assert!(matches!(err, gv_app::AppError::InvalidInput(_)), "{err}");
    assert_eq!(svc.state(), SimState::Running);

    svc.stop().unwrap();
    let t_stop = svc.sim_time_s();
    svc.step(5).unwrap();
    wait_until(|| svc.state() == SimState::Stopped);
    assert!((svc.sim_time_s() - (t_stop + 5e-3)).abs() < 1e-9);
}

#[test]
fn script_round_trip_through_the_facade() {
    let svc = CircuitService::new();
    let script = "\
power aa ca 12
resistor aa ba 1
resistor ba ca 2
ground ca
set dt 1m
set ramp off
";
    svc.load_script_text(script).unwrap();
    assert_eq!(svc.script_text(), script);

    svc.step(10).unwrap();
    wait_until(|| svc.state() == SimState::Stopped);
    assert!((svc.sim_time_s() - 10e-3).abs() < 1e-9);
}

#[test]
fn bad_topology_is_reported_and_stays_in_reset() {
    let svc = CircuitService::new();
    svc.add_component(
        ComponentKind::Resistor { ohms: ohm(1.0) },
        loc("aa"),
        loc("ba"),
    )
    .unwrap();
    // No ground: run must fail with a topology error
    let err = svc.run().unwrap_err();
    assert!(matches!(err, gv_app::AppError::Topology(_)), "{err}");
    assert_eq!(svc.state(), SimState::Reset);
}
