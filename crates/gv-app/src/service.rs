//! The circuit service facade.
//!
//! One `CircuitService` owns the clock worker and the shared model; CLI and
//! GUI frontends drive everything through it. Topology-mutating commands
//! force a Reset transition first, which is the system's mutual-exclusion
//! discipline: the solver is guaranteed idle while the schematic changes.

use std::path::Path;
use std::sync::Arc;

use gv_components::ComponentKind;
use gv_core::{CompId, GridLocation, TermRef, TermSide};
use gv_scope::{ComponentSample, NodeSample, ScopeHistory, StepRecord};
use gv_sim::{SimParams, SimShared, SimState, SimWorker};
use gv_solver::component_powers;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub struct CircuitService {
    shared: Arc<SimShared>,
    _worker: SimWorker,
}

impl Default for CircuitService {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitService {
    /// Start the service with an empty schematic and an idle clock.
    pub fn new() -> Self {
        let shared = Arc::new(SimShared::new());
        let worker = SimWorker::spawn(Arc::clone(&shared));
        Self {
            shared,
            _worker: worker,
        }
    }

    fn ensure_reset(&self) -> AppResult<()> {
        if self.shared.state.current() != SimState::Reset {
            self.shared.state.request(SimState::Reset)?;
        }
        Ok(())
    }

    // ---- topology commands -------------------------------------------------

    pub fn add_component(
        &self,
        kind: ComponentKind,
        a: GridLocation,
        b: GridLocation,
    ) -> AppResult<CompId> {
        self.ensure_reset()?;
        let mut model = self.shared.model.lock().unwrap();
        let id = model.schematic.add(kind, a, b)?;
        model.schematic.mark_ground();
        debug!(id = %id, kind = kind.name(), "component added");
        Ok(id)
    }

    pub fn delete_component(&self, id: CompId) -> AppResult<()> {
        self.ensure_reset()?;
        let mut model = self.shared.model.lock().unwrap();
        model.schematic.remove(id)?;
        model.schematic.mark_ground();
        Ok(())
    }

    pub fn set_ground(&self, loc: Option<GridLocation>) -> AppResult<()> {
        self.ensure_reset()?;
        let mut model = self.shared.model.lock().unwrap();
        model.schematic.set_ground(loc)?;
        model.schematic.mark_ground();
        Ok(())
    }

    // ---- clock commands ----------------------------------------------------

    /// Start a fresh run: compile the schematic and enter Running.
    pub fn run(&self) -> AppResult<()> {
        self.ensure_reset()?;
        self.shared.model.lock().unwrap().params.step_count = None;
        self.shared.state.request(SimState::Running)?;
        Ok(())
    }

    pub fn stop(&self) -> AppResult<()> {
        self.shared.state.request(SimState::Stopped)?;
        Ok(())
    }

    /// Resume a stopped run without recompiling.
    pub fn continue_run(&self) -> AppResult<()> {
        self.shared.model.lock().unwrap().params.step_count = None;
        self.shared.state.request(SimState::Running)?;
        Ok(())
    }

    pub fn reset(&self) -> AppResult<()> {
        self.shared.state.request(SimState::Reset)?;
        Ok(())
    }

    /// Advance exactly `count` steps, then stop. Starts a fresh run from
    /// Reset or extends a stopped one. A running clock has already latched
    /// its step budget, so stepping it is rejected rather than ignored.
    pub fn step(&self, count: u64) -> AppResult<()> {
        if count == 0 {
            return Err(AppError::InvalidInput("step count must be positive".into()));
        }
        if self.state() == SimState::Running {
            return Err(AppError::InvalidInput(
                "clock is running: stop before stepping".into(),
            ));
        }
        self.shared.model.lock().unwrap().params.step_count = Some(count);
        self.shared.state.request(SimState::Running)?;
        Ok(())
    }

    // ---- parameters --------------------------------------------------------

    pub fn params(&self) -> SimParams {
        self.shared.model.lock().unwrap().params.clone()
    }

    /// Edit run parameters. Changes take effect when the next run compiles.
    pub fn update_params(&self, edit: impl FnOnce(&mut SimParams)) {
        edit(&mut self.shared.model.lock().unwrap().params);
    }

    // ---- queries -----------------------------------------------------------

    pub fn state(&self) -> SimState {
        self.shared.state.current()
    }

    pub fn sim_time_s(&self) -> f64 {
        self.shared.sim_time_s()
    }

    pub fn failed_steps(&self) -> u64 {
        self.shared
            .failed_steps
            .load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Per-node snapshots of the committed solver state. Empty in Reset.
    pub fn node_samples(&self) -> Vec<NodeSample> {
        Self::nodes_from(&self.shared.model.lock().unwrap())
    }

    /// Per-component snapshots of the committed solver state. Empty in Reset.
    pub fn component_samples(&self) -> Vec<ComponentSample> {
        Self::components_from(&self.shared.model.lock().unwrap())
    }

    fn nodes_from(model: &gv_sim::CircuitModel) -> Vec<NodeSample> {
        let (Some(graph), Some(solver)) = (model.graph(), model.solver()) else {
            return Vec::new();
        };
        graph
            .nodes()
            .iter()
            .map(|node| NodeSample {
                node_id: node.id.index(),
                locations: node.locations.iter().map(|l| l.label()).collect(),
                voltage_v: solver.v_now[node.id.index() as usize],
                ground: node.ground,
            })
            .collect()
    }

    fn components_from(model: &gv_sim::CircuitModel) -> Vec<ComponentSample> {
        let (Some(graph), Some(solver)) = (model.graph(), model.solver()) else {
            return Vec::new();
        };
        let powers = component_powers(&model.schematic, graph, solver);
        model
            .schematic
            .components()
            .filter(|placed| !placed.kind.is_connector())
            .map(|placed| {
                let slot = placed.id.index() as usize;
                ComponentSample {
                    component_id: placed.id.index(),
                    kind: placed.kind.name().to_string(),
                    current_a: solver.i_now[slot],
                    power_w: powers[slot],
                    mean_power_w: model.mean_power_w(slot),
                }
            })
            .collect()
    }

    /// The scope buffer of the current run, readable without the model lock.
    pub fn scope(&self) -> Option<Arc<ScopeHistory>> {
        self.shared.model.lock().unwrap().scope()
    }

    /// Node a component terminal belongs to, for probing. `None` in Reset.
    pub fn node_of(&self, comp: CompId, side: TermSide) -> Option<u32> {
        let model = self.shared.model.lock().unwrap();
        model
            .graph()
            .and_then(|g| g.node_of(TermRef::new(comp, side)))
            .map(|n| n.index())
    }

    /// One full step record, timestamped now. All values come from a single
    /// committed step.
    pub fn snapshot(&self) -> AppResult<StepRecord> {
        let model = self.shared.model.lock().unwrap();
        let nodes = Self::nodes_from(&model);
        if nodes.is_empty() {
            return Err(AppError::InvalidInput(
                "nothing compiled: run or step first".into(),
            ));
        }
        Ok(StepRecord {
            exported_at: chrono::Utc::now().to_rfc3339(),
            sim_time_s: self.sim_time_s(),
            dt_s: model.dt_s(),
            failed_steps: self.failed_steps(),
            nodes,
            components: Self::components_from(&model),
        })
    }

    // ---- scripts -----------------------------------------------------------

    /// Replace the circuit by replaying a script through the command set.
    pub fn load_script_text(&self, text: &str) -> AppResult<()> {
        self.ensure_reset()?;
        let (sch, params) = gv_project::read_script(text)?;
        let mut model = self.shared.model.lock().unwrap();
        model.schematic = sch;
        model.params = params;
        Ok(())
    }

    pub fn script_text(&self) -> String {
        let model = self.shared.model.lock().unwrap();
        gv_project::write_script(&model.schematic, &model.params)
    }

    pub fn load_script(&self, path: &Path) -> AppResult<()> {
        let text = std::fs::read_to_string(path)?;
        self.load_script_text(&text)
    }

    pub fn save_script(&self, path: &Path) -> AppResult<()> {
        std::fs::write(path, self.script_text())?;
        Ok(())
    }
}
