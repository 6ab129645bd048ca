//! Parser and writer for the circuit script.

use gv_components::value::{format_value, parse_value};
use gv_components::{ComponentKind, PowerSource};
use gv_core::grid::GridLocation;
use gv_core::units::{amp, farad, henry, hz, ohm, volt};
use gv_graph::Schematic;
use gv_scope::ScopeMode;
use gv_sim::SimParams;

use crate::{ProjectError, ProjectResult};

fn fail(line: usize, what: impl Into<String>) -> ProjectError {
    ProjectError::Parse {
        line,
        what: what.into(),
    }
}

fn parse_loc(line: usize, label: &str) -> ProjectResult<GridLocation> {
    GridLocation::parse_label(label).map_err(|e| fail(line, e.to_string()))
}

fn parse_num(line: usize, text: &str) -> ProjectResult<f64> {
    parse_value(text).map_err(|e| fail(line, e.to_string()))
}

/// Parse a script into a schematic and run parameters.
///
/// Lines are independent: a component per line, `ground <loc>`, and
/// `set <param> <value>`. `#` starts a comment. Ground marks are propagated
/// before returning, so the result is ready to compile.
pub fn read_script(text: &str) -> ProjectResult<(Schematic, SimParams)> {
    let mut sch = Schematic::new();
    let mut params = SimParams::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let words: Vec<&str> = content.split_whitespace().collect();
        match words[0] {
            "ground" => {
                if words.len() != 2 {
                    return Err(fail(line, "expected: ground <loc>"));
                }
                sch.set_ground(Some(parse_loc(line, words[1])?))
                    .map_err(|e| fail(line, e.to_string()))?;
            }
            "set" => {
                if words.len() != 3 {
                    return Err(fail(line, "expected: set <param> <value>"));
                }
                apply_setting(&mut params, line, words[1], words[2])?;
            }
            kind => {
                if words.len() < 3 {
                    return Err(fail(line, "expected: <kind> <locA> <locB> [value...]"));
                }
                let a = parse_loc(line, words[1])?;
                let b = parse_loc(line, words[2])?;
                let kind = parse_component(line, kind, &words[3..])?;
                sch.add(kind, a, b).map_err(|e| fail(line, e.to_string()))?;
            }
        }
    }

    sch.mark_ground();
    Ok((sch, params))
}

fn parse_component(line: usize, kind: &str, args: &[&str]) -> ProjectResult<ComponentKind> {
    let one_value = |what: &str| -> ProjectResult<f64> {
        match args {
            [v] => parse_num(line, v),
            _ => Err(fail(line, format!("{what} takes exactly one value"))),
        }
    };
    match kind {
        "wire" => {
            if !args.is_empty() {
                return Err(fail(line, "wire takes no value"));
            }
            Ok(ComponentKind::Connector)
        }
        "diode" => {
            if !args.is_empty() {
                return Err(fail(line, "diode takes no value"));
            }
            Ok(ComponentKind::Diode)
        }
        "resistor" => Ok(ComponentKind::Resistor {
            ohms: ohm(one_value("resistor")?),
        }),
        "capacitor" => Ok(ComponentKind::Capacitor {
            farads: farad(one_value("capacitor")?),
        }),
        "inductor" => match args {
            [l] => Ok(ComponentKind::Inductor {
                henrys: henry(parse_num(line, l)?),
                initial_current: amp(0.0),
            }),
            [l, i0] => Ok(ComponentKind::Inductor {
                henrys: henry(parse_num(line, l)?),
                initial_current: amp(parse_num(line, i0)?),
            }),
            _ => Err(fail(line, "expected: inductor <locA> <locB> <L> [I0]")),
        },
        "power" => {
            let src = match args {
                [v] => PowerSource::dc(volt(parse_num(line, v)?)),
                [v, "sine", f] => {
                    PowerSource::sine(volt(parse_num(line, v)?), hz(parse_num(line, f)?))
                        .map_err(|e| fail(line, e.to_string()))?
                }
                [v, "square", f] => {
                    PowerSource::square(volt(parse_num(line, v)?), hz(parse_num(line, f)?))
                        .map_err(|e| fail(line, e.to_string()))?
                }
                _ => {
                    return Err(fail(
                        line,
                        "expected: power <locA> <locB> <V> [sine|square <freq>]",
                    ))
                }
            };
            Ok(ComponentKind::Power(src))
        }
        other => Err(fail(line, format!("unknown component kind `{other}`"))),
    }
}

fn apply_setting(
    params: &mut SimParams,
    line: usize,
    key: &str,
    value: &str,
) -> ProjectResult<()> {
    match key {
        "dt" => params.dt_s = Some(parse_num(line, value)?),
        "duration" => params.run_duration_s = Some(parse_num(line, value)?),
        "steps" => {
            params.step_count = Some(
                value
                    .parse()
                    .map_err(|_| fail(line, format!("bad step count `{value}`")))?,
            )
        }
        "ramp" => {
            params.dc_ramp = match value {
                "on" => true,
                "off" => false,
                _ => return Err(fail(line, "ramp is on or off")),
            }
        }
        "span" => params.scope_span_s = parse_num(line, value)?,
        "mode" => {
            params.scope_mode = match value {
                "continuous" => ScopeMode::Continuous,
                "oneshot" => ScopeMode::OneShot,
                _ => return Err(fail(line, "mode is continuous or oneshot")),
            }
        }
        "trigger" => params.scope_trigger = Some(parse_num(line, value)?),
        other => return Err(fail(line, format!("unknown parameter `{other}`"))),
    }
    Ok(())
}

/// Render a schematic and its parameters back to script form.
///
/// Components come out in slot order; only parameters differing from the
/// defaults are written, so a freshly parsed script rewrites to itself.
pub fn write_script(sch: &Schematic, params: &SimParams) -> String {
    let mut out = String::new();

    for placed in sch.components() {
        let a = placed.ends[0].label();
        let b = placed.ends[1].label();
        out.push_str(placed.kind.name());
        out.push(' ');
        out.push_str(&a);
        out.push(' ');
        out.push_str(&b);
        match &placed.kind {
            ComponentKind::Connector | ComponentKind::Diode => {}
            ComponentKind::Resistor { ohms } => {
                out.push(' ');
                out.push_str(&format_value(ohms.value));
            }
            ComponentKind::Capacitor { farads } => {
                out.push(' ');
                out.push_str(&format_value(farads.value));
            }
            ComponentKind::Inductor {
                henrys,
                initial_current,
            } => {
                out.push(' ');
                out.push_str(&format_value(henrys.value));
                if initial_current.value != 0.0 {
                    out.push(' ');
                    out.push_str(&format_value(initial_current.value));
                }
            }
            ComponentKind::Power(src) => {
                out.push(' ');
                out.push_str(&format_value(src.amplitude.value));
                match src.waveform {
                    gv_components::Waveform::Dc => {}
                    gv_components::Waveform::Sine { freq } => {
                        out.push_str(&format!(" sine {}", format_value(freq.value)));
                    }
                    gv_components::Waveform::Square { freq } => {
                        out.push_str(&format!(" square {}", format_value(freq.value)));
                    }
                }
            }
        }
        out.push('\n');
    }

    if let Some(g) = sch.ground() {
        out.push_str(&format!("ground {}\n", g.label()));
    }

    let defaults = SimParams::default();
    if let Some(dt) = params.dt_s {
        out.push_str(&format!("set dt {}\n", format_value(dt)));
    }
    if let Some(d) = params.run_duration_s {
        out.push_str(&format!("set duration {}\n", format_value(d)));
    }
    if let Some(n) = params.step_count {
        out.push_str(&format!("set steps {n}\n"));
    }
    if params.dc_ramp != defaults.dc_ramp {
        out.push_str("set ramp off\n");
    }
    if params.scope_span_s != defaults.scope_span_s {
        out.push_str(&format!("set span {}\n", format_value(params.scope_span_s)));
    }
    if params.scope_mode != defaults.scope_mode {
        out.push_str("set mode oneshot\n");
    }
    if let Some(level) = params.scope_trigger {
        out.push_str(&format!("set trigger {}\n", format_value(level)));
    }
    out
}
