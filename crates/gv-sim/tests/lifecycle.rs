//! End-to-end clock lifecycle: compile on run, auto-stop, forced reset.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gv_components::{ComponentKind, PowerSource};
use gv_core::grid::GridLocation;
use gv_core::units::{ohm, volt};
use gv_core::{CompId, TermRef, TermSide};
use gv_sim::{SimShared, SimState, SimWorker};

fn loc(label: &str) -> GridLocation {
    GridLocation::parse_label(label).unwrap()
}

fn wait_until(pred: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !pred() {
        assert!(Instant::now() < deadline, "timed out waiting on the clock");
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// 12V through 1 ohm to a midpoint, 2 ohms to ground.
fn build_divider(shared: &SimShared) {
    let mut model = shared.model.lock().unwrap();
    model
        .schematic
        .add(
            ComponentKind::Power(PowerSource::dc(volt(12.0))),
            loc("aa"),
            loc("ca"),
        )
        .unwrap();
    model
        .schematic
        .add(ComponentKind::Resistor { ohms: ohm(1.0) }, loc("aa"), loc("ba"))
        .unwrap();
    model
        .schematic
        .add(ComponentKind::Resistor { ohms: ohm(2.0) }, loc("ba"), loc("ca"))
        .unwrap();
    model.schematic.set_ground(Some(loc("ca"))).unwrap();
    model.params.dt_s = Some(1e-3);
    model.params.dc_ramp = false;
}

#[test]
fn step_run_solves_and_auto_stops() {
    let shared = Arc::new(SimShared::new());
    build_divider(&shared);
    shared.model.lock().unwrap().params.step_count = Some(50);

    let worker = SimWorker::spawn(Arc::clone(&shared));
    let reached = shared.state.request(SimState::Running).unwrap();
    assert_eq!(reached, SimState::Running);

    wait_until(|| shared.state.current() == SimState::Stopped);
    assert!((shared.sim_time_s() - 50e-3).abs() < 1e-9);
    assert_eq!(shared.failed_steps.load(std::sync::atomic::Ordering::Relaxed), 0);

    let model = shared.model.lock().unwrap();
    let graph = model.graph().expect("graph survives a stop");
    let solver = model.solver().unwrap();
    let mid = graph
        .node_of(TermRef::new(CompId::from_index(1), TermSide::B))
        .unwrap();
    let v_mid = solver.v_now[mid.index() as usize];
    assert!((v_mid - 8.0).abs() < 1e-3, "v_mid = {v_mid}");
    drop(model);
    worker.shutdown();
}

#[test]
fn run_duration_stops_the_clock() {
    let shared = Arc::new(SimShared::new());
    build_divider(&shared);
    shared.model.lock().unwrap().params.run_duration_s = Some(0.02);

    let worker = SimWorker::spawn(Arc::clone(&shared));
    shared.state.request(SimState::Running).unwrap();
    wait_until(|| shared.state.current() == SimState::Stopped);
    assert!(shared.sim_time_s() >= 0.02);
    worker.shutdown();
}

#[test]
fn reset_while_running_lands_in_reset_before_returning() {
    let shared = Arc::new(SimShared::new());
    build_divider(&shared); // no duration: runs until told otherwise

    let worker = SimWorker::spawn(Arc::clone(&shared));
    shared.state.request(SimState::Running).unwrap();
    std::thread::sleep(Duration::from_millis(10));

    let reached = shared.state.request(SimState::Reset).unwrap();
    assert_eq!(reached, SimState::Reset);
    assert_eq!(shared.state.current(), SimState::Reset);
    assert_eq!(shared.sim_time_s(), 0.0);
    assert!(shared.model.lock().unwrap().graph().is_none());
    worker.shutdown();
}

#[test]
fn stop_and_continue_resume_the_same_run() {
    let shared = Arc::new(SimShared::new());
    build_divider(&shared);

    let worker = SimWorker::spawn(Arc::clone(&shared));
    shared.state.request(SimState::Running).unwrap();
    wait_until(|| shared.sim_time_s() > 5e-3);
    shared.state.request(SimState::Stopped).unwrap();
    let t_stop = shared.sim_time_s();

    shared.state.request(SimState::Running).unwrap();
    wait_until(|| shared.sim_time_s() > t_stop + 5e-3);
    shared.state.request(SimState::Stopped).unwrap();
    worker.shutdown();
}

#[test]
fn compile_failure_stays_in_reset() {
    let shared = Arc::new(SimShared::new());
    {
        let mut model = shared.model.lock().unwrap();
        // No ground anywhere: compilation must refuse this
        model
            .schematic
            .add(
                ComponentKind::Power(PowerSource::dc(volt(5.0))),
                loc("aa"),
                loc("ba"),
            )
            .unwrap();
        model
            .schematic
            .add(ComponentKind::Resistor { ohms: ohm(10.0) }, loc("aa"), loc("ba"))
            .unwrap();
    }
    let worker = SimWorker::spawn(Arc::clone(&shared));
    let err = shared.state.request(SimState::Running).unwrap_err();
    assert!(matches!(err, gv_sim::SimError::Compile(_)));
    assert_eq!(shared.state.current(), SimState::Reset);
    worker.shutdown();
}

#[test]
fn missing_time_step_forces_stopped() {
    let shared = Arc::new(SimShared::new());
    {
        let mut model = shared.model.lock().unwrap();
        // Resistor loop with ground but no source and no explicit dt
        model
            .schematic
            .add(ComponentKind::Resistor { ohms: ohm(10.0) }, loc("aa"), loc("ba"))
            .unwrap();
        model
            .schematic
            .add(ComponentKind::Resistor { ohms: ohm(10.0) }, loc("aa"), loc("ba"))
            .unwrap();
        model.schematic.set_ground(Some(loc("ba"))).unwrap();
    }
    let worker = SimWorker::spawn(Arc::clone(&shared));
    let err = shared.state.request(SimState::Running).unwrap_err();
    assert!(matches!(err, gv_sim::SimError::NoTimeStep { .. }));
    assert_eq!(shared.state.current(), SimState::Stopped);
    worker.shutdown();
}
