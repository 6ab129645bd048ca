//! Simulation parameters and time-step derivation.

use gv_core::numeric::Real;
use gv_graph::Schematic;
use gv_scope::{ScopeMode, SCOPE_SLOTS};
use gv_solver::MAX_ITERATIONS;

use crate::error::{SimError, SimResult};

/// Fallback step when only DC sources are present.
pub const DC_DEFAULT_DT_S: Real = 1e-3;

/// Steps an AC source's period is divided into when deriving Δt.
const PERIOD_DIVISIONS: Real = 1000.0;

/// Tunable run parameters, settable through the facade between runs.
#[derive(Debug, Clone)]
pub struct SimParams {
    /// Explicit time step; `None` derives one from the circuit.
    pub dt_s: Option<Real>,
    /// Auto-stop after this much simulation time.
    pub run_duration_s: Option<Real>,
    /// Auto-stop after this many steps (single-step / N-step runs).
    pub step_count: Option<u64>,
    /// Ramp DC sources up over the fixed ramp time instead of stepping.
    pub dc_ramp: bool,
    /// Fixed-point iteration cap per step.
    pub max_iterations: usize,
    pub diode_law: gv_components::DiodeLaw,
    /// Time covered by one scope window.
    pub scope_span_s: Real,
    pub scope_mode: ScopeMode,
    /// Rising-edge trigger level on the first scope trace.
    pub scope_trigger: Option<Real>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt_s: None,
            run_duration_s: None,
            step_count: None,
            dc_ramp: true,
            max_iterations: MAX_ITERATIONS,
            diode_law: gv_components::DiodeLaw::default(),
            scope_span_s: 0.01,
            scope_mode: ScopeMode::Continuous,
            scope_trigger: None,
        }
    }
}

impl SimParams {
    /// Span of one scope-history bin.
    pub fn scope_bin_s(&self) -> Real {
        self.scope_span_s / SCOPE_SLOTS as Real
    }
}

/// Pick the Δt a run will use.
///
/// Preference order: an explicit positive configured value; 1/1000 of the
/// fastest AC source's period, capped to one scope bin so every bin gets a
/// sample; the fixed DC fallback when sources exist but none are AC. A
/// circuit with no power sources has no natural time scale and is an error.
pub fn effective_dt(sch: &Schematic, params: &SimParams) -> SimResult<Real> {
    if let Some(dt) = params.dt_s {
        if dt > 0.0 {
            return Ok(dt);
        }
        return Err(SimError::InvalidArg {
            what: "explicit dt must be positive",
        });
    }

    let mut fastest_hz: Option<Real> = None;
    let mut has_power = false;
    for comp in sch.components() {
        if let Some(src) = comp.kind.as_power() {
            has_power = true;
            if let Some(freq) = src.frequency() {
                let hz = freq.value;
                fastest_hz = Some(fastest_hz.map_or(hz, |f: Real| f.max(hz)));
            }
        }
    }

    match fastest_hz {
        Some(hz) => {
            let dt = 1.0 / (hz * PERIOD_DIVISIONS);
            Ok(dt.min(params.scope_bin_s()))
        }
        None if has_power => Ok(DC_DEFAULT_DT_S),
        None => Err(SimError::NoTimeStep {
            why: "circuit has no power source and no explicit dt",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_components::{ComponentKind, PowerSource};
    use gv_core::grid::GridLocation;
    use gv_core::units::{hz, ohm, volt};

    fn loc(label: &str) -> GridLocation {
        GridLocation::parse_label(label).unwrap()
    }

    fn divider(src: PowerSource) -> Schematic {
        let mut sch = Schematic::new();
        sch.add(ComponentKind::Power(src), loc("aa"), loc("ca"))
            .unwrap();
        sch.add(
            ComponentKind::Resistor { ohms: ohm(100.0) },
            loc("aa"),
            loc("ca"),
        )
        .unwrap();
        sch
    }

    #[test]
    fn explicit_dt_wins() {
        let sch = divider(PowerSource::sine(volt(5.0), hz(1e6)).unwrap());
        let params = SimParams {
            dt_s: Some(42e-6),
            ..Default::default()
        };
        assert_eq!(effective_dt(&sch, &params).unwrap(), 42e-6);
    }

    #[test]
    fn ac_source_gets_a_thousandth_of_its_period() {
        let sch = divider(PowerSource::sine(volt(5.0), hz(1000.0)).unwrap());
        let dt = effective_dt(&sch, &SimParams::default()).unwrap();
        assert!((dt - 1e-6).abs() < 1e-12);
    }

    #[test]
    fn slow_ac_is_capped_to_one_scope_bin() {
        let sch = divider(PowerSource::square(volt(5.0), hz(0.1)).unwrap());
        let params = SimParams::default();
        let dt = effective_dt(&sch, &params).unwrap();
        // period/1000 = 10ms would overshoot the 20us bin
        assert_eq!(dt, params.scope_bin_s());
    }

    #[test]
    fn dc_only_falls_back_to_a_millisecond() {
        let sch = divider(PowerSource::dc(volt(12.0)));
        let dt = effective_dt(&sch, &SimParams::default()).unwrap();
        assert_eq!(dt, DC_DEFAULT_DT_S);
    }

    #[test]
    fn no_sources_is_a_configuration_error() {
        let mut sch = Schematic::new();
        sch.add(
            ComponentKind::Resistor { ohms: ohm(100.0) },
            loc("aa"),
            loc("ca"),
        )
        .unwrap();
        let err = effective_dt(&sch, &SimParams::default()).unwrap_err();
        assert!(matches!(err, SimError::NoTimeStep { .. }));
    }
}
