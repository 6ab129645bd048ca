//! The clock worker: owns the run loop, applies transitions, ticks the
//! solver, and records telemetry.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gv_graph::{compile, NodeGraph, Schematic};
use gv_scope::{ScopeHistory, TimedAverage};
use gv_solver::{component_powers, solve_step, SolverState, StepConfig};
use tracing::{debug, warn};

use crate::clock::{effective_dt, SimParams};
use crate::error::{SimError, SimResult};
use crate::state::{SimState, StateCell};

/// How long the worker sleeps between polls when not Running.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Bins in each component's windowed power average.
const POWER_AVG_BINS: usize = 100;

/// Everything the worker needs behind one lock: the schematic plus the
/// run-time artifacts built from it on Reset -> Running.
///
/// Topology edits require the machine to be in Reset, so the solver is idle
/// whenever `schematic` is mutated; the lock is only ever briefly contended
/// between the worker's tick and facade reads.
#[derive(Debug, Default)]
pub struct CircuitModel {
    pub schematic: Schematic,
    pub params: SimParams,
    graph: Option<NodeGraph>,
    solver: Option<SolverState>,
    scope: Option<Arc<ScopeHistory>>,
    power_avgs: Vec<Option<TimedAverage>>,
    dt_s: f64,
    steps_left: Option<u64>,
}

impl CircuitModel {
    pub fn graph(&self) -> Option<&NodeGraph> {
        self.graph.as_ref()
    }

    pub fn solver(&self) -> Option<&SolverState> {
        self.solver.as_ref()
    }

    /// The scope buffer for the current run; readers clone the Arc and read
    /// slots without holding the model lock.
    pub fn scope(&self) -> Option<Arc<ScopeHistory>> {
        self.scope.clone()
    }

    /// Effective Δt of the current run; 0 before the first compile.
    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    /// Windowed mean dissipation for a component slot, if it has history.
    pub fn mean_power_w(&self, slot: usize) -> Option<f64> {
        self.power_avgs
            .get(slot)
            .and_then(|a| a.as_ref())
            .map(TimedAverage::query)
    }

    fn clear_runtime(&mut self) {
        self.graph = None;
        self.solver = None;
        self.scope = None;
        self.power_avgs.clear();
        self.dt_s = 0.0;
        self.steps_left = None;
    }

    /// Compile the schematic and build the run-time state.
    fn prepare(&mut self) -> SimResult<()> {
        self.schematic.mark_ground();
        let graph = compile(&self.schematic)?;
        let dt = effective_dt(&self.schematic, &self.params)?;

        let solver = SolverState::for_graph(&self.schematic, &graph, &self.params.diode_law);
        let traces = graph.nodes().len() + self.schematic.slot_count();
        let scope = Arc::new(ScopeHistory::new(
            traces,
            self.params.scope_span_s,
            self.params.scope_mode,
        ));
        scope.set_trigger(self.params.scope_trigger);
        let mut avgs: Vec<Option<TimedAverage>> =
            (0..self.schematic.slot_count()).map(|_| None).collect();
        for placed in self.schematic.components() {
            if !placed.kind.is_connector() {
                avgs[placed.id.index() as usize] =
                    Some(TimedAverage::new(self.params.scope_span_s, POWER_AVG_BINS));
            }
        }
        self.power_avgs = avgs;

        self.graph = Some(graph);
        self.solver = Some(solver);
        self.scope = Some(scope);
        self.dt_s = dt;
        self.steps_left = self.params.step_count;
        Ok(())
    }
}

/// State shared between the worker thread and its clients.
#[derive(Debug)]
pub struct SimShared {
    pub state: StateCell,
    pub model: Mutex<CircuitModel>,
    /// Committed simulation time, f64 bits.
    sim_time_bits: AtomicU64,
    /// Steps that hit the iteration cap without stabilizing.
    pub failed_steps: AtomicU64,
    shutdown: AtomicBool,
}

impl Default for SimShared {
    fn default() -> Self {
        Self::new()
    }
}

impl SimShared {
    pub fn new() -> Self {
        Self {
            state: StateCell::new(),
            model: Mutex::new(CircuitModel::default()),
            sim_time_bits: AtomicU64::new(0f64.to_bits()),
            failed_steps: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn sim_time_s(&self) -> f64 {
        f64::from_bits(self.sim_time_bits.load(Ordering::Relaxed))
    }

    fn store_sim_time(&self, t_s: f64) {
        self.sim_time_bits.store(t_s.to_bits(), Ordering::Relaxed);
    }
}

/// Handle to the dedicated clock thread.
pub struct SimWorker {
    shared: Arc<SimShared>,
    handle: Option<JoinHandle<()>>,
}

impl SimWorker {
    /// Start the worker. It idles in Reset until a transition is requested.
    pub fn spawn(shared: Arc<SimShared>) -> Self {
        let handle = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("gv-sim-clock".into())
                .spawn(move || Self::run(&shared))
                .expect("failed to spawn clock thread")
        };
        Self {
            shared,
            handle: Some(handle),
        }
    }

    pub fn shared(&self) -> &Arc<SimShared> {
        &self.shared
    }

    fn run(shared: &SimShared) {
        loop {
            if shared.shutdown.load(Ordering::Relaxed) {
                break;
            }
            if let Some(target) = shared.state.take_request() {
                Self::apply_transition(shared, target);
                continue;
            }
            if shared.state.current() == SimState::Running {
                Self::tick(shared);
            } else {
                thread::sleep(IDLE_SLEEP);
            }
        }
    }

    fn apply_transition(shared: &SimShared, target: SimState) {
        let current = shared.state.current();
        debug!(%current, %target, "state transition requested");
        match (current, target) {
            (_, SimState::Reset) => {
                let mut model = shared.model.lock().unwrap();
                model.clear_runtime();
                drop(model);
                shared.store_sim_time(0.0);
                shared.failed_steps.store(0, Ordering::Relaxed);
                shared.state.acknowledge(SimState::Reset, None);
            }
            (SimState::Reset, SimState::Running) => {
                let mut model = shared.model.lock().unwrap();
                let prepared = model.prepare();
                drop(model);
                match prepared {
                    Ok(()) => {
                        shared.store_sim_time(0.0);
                        shared.failed_steps.store(0, Ordering::Relaxed);
                        shared.state.acknowledge(SimState::Running, None);
                    }
                    Err(e @ SimError::NoTimeStep { .. }) => {
                        warn!(error = %e, "no usable time step, forcing stop");
                        shared.state.acknowledge(SimState::Stopped, Some(e));
                    }
                    Err(e) => {
                        warn!(error = %e, "compile failed, staying in reset");
                        shared.state.acknowledge(SimState::Reset, Some(e));
                    }
                }
            }
            (SimState::Stopped, SimState::Running) => {
                // Continue: the compiled graph and solver state carry over.
                let mut model = shared.model.lock().unwrap();
                if model.graph.is_some() {
                    model.steps_left = model.params.step_count;
                    drop(model);
                    shared.state.acknowledge(SimState::Running, None);
                } else {
                    drop(model);
                    shared.state.acknowledge(
                        SimState::Stopped,
                        Some(SimError::InvalidArg {
                            what: "nothing to continue, reset first",
                        }),
                    );
                }
            }
            (_, SimState::Stopped) => {
                shared.state.acknowledge(SimState::Stopped, None);
            }
            // Running -> Running and the like
            (state, _) => {
                shared.state.acknowledge(state, None);
            }
        }
    }

    fn tick(shared: &SimShared) {
        let mut model = shared.model.lock().unwrap();
        let CircuitModel {
            schematic,
            params,
            graph,
            solver,
            scope,
            power_avgs,
            dt_s,
            steps_left,
        } = &mut *model;
        let (Some(graph), Some(solver)) = (graph.as_ref(), solver.as_mut()) else {
            drop(model);
            shared.state.publish(SimState::Stopped);
            return;
        };

        let t_now = shared.sim_time_s();
        let dt = *dt_s;
        let cfg = StepConfig {
            max_iterations: params.max_iterations,
            dc_ramp: params.dc_ramp,
            diode_law: params.diode_law,
        };
        match solve_step(schematic, graph, solver, t_now, dt, &cfg) {
            Ok(outcome) => {
                if !outcome.converged {
                    let n = shared.failed_steps.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        t_s = t_now,
                        iterations = outcome.iterations,
                        failed_steps = n,
                        "step accepted without stabilizing"
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, "solver rejected the step, stopping");
                drop(model);
                shared.state.publish(SimState::Stopped);
                return;
            }
        }
        let t_next = t_now + dt;

        if let Some(scope) = scope {
            let mut samples =
                Vec::with_capacity(graph.nodes().len() + schematic.slot_count());
            samples.extend_from_slice(&solver.v_now);
            for slot in 0..schematic.slot_count() {
                let occupied = power_avgs.get(slot).is_some_and(Option::is_some);
                samples.push(if occupied { solver.i_now[slot] } else { f64::NAN });
            }
            scope.record(t_next, &samples);
        }
        for (slot, p) in component_powers(schematic, graph, solver)
            .into_iter()
            .enumerate()
        {
            if let Some(Some(avg)) = power_avgs.get_mut(slot) {
                avg.record(t_next, p);
            }
        }
        shared.store_sim_time(t_next);

        // Auto-stop on step-count or run-duration exhaustion.
        let mut done = false;
        if let Some(left) = steps_left {
            *left = left.saturating_sub(1);
            done = *left == 0;
        }
        if let Some(duration) = params.run_duration_s {
            done = done || t_next >= duration;
        }
        drop(model);
        if done {
            debug!(t_s = t_next, "run exhausted, stopping");
            shared.state.publish(SimState::Stopped);
        }
    }

    /// Stop the worker thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    fn stop_thread(&mut self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SimWorker {
    fn drop(&mut self) {
        self.stop_thread();
    }
}
