//! Snapshot record types for telemetry export.

use serde::{Deserialize, Serialize};

/// One node's published values at a step boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSample {
    pub node_id: u32,
    /// Two-char grid labels merged into this node.
    pub locations: Vec<String>,
    pub voltage_v: f64,
    pub ground: bool,
}

/// One component's published values at a step boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSample {
    pub component_id: u32,
    pub kind: String,
    pub current_a: f64,
    pub power_w: f64,
    /// Windowed mean dissipation, when enough history exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_power_w: Option<f64>,
}

/// A full converged-step snapshot, one JSON object per line on export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Wall-clock timestamp of the export, RFC 3339.
    pub exported_at: String,
    pub sim_time_s: f64,
    pub dt_s: f64,
    pub failed_steps: u64,
    pub nodes: Vec<NodeSample>,
    pub components: Vec<ComponentSample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_record_round_trips_through_json() {
        let rec = StepRecord {
            exported_at: "2026-08-29T00:00:00Z".into(),
            sim_time_s: 0.25,
            dt_s: 1e-3,
            failed_steps: 0,
            nodes: vec![NodeSample {
                node_id: 1,
                locations: vec!["aa".into(), "ba".into()],
                voltage_v: 8.0,
                ground: false,
            }],
            components: vec![ComponentSample {
                component_id: 2,
                kind: "resistor".into(),
                current_a: 4.0,
                power_w: 16.0,
                mean_power_w: None,
            }],
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(!json.contains("mean_power_w"));
        let back: StepRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes[0].voltage_v, 8.0);
        assert_eq!(back.components[0].kind, "resistor");
    }
}
