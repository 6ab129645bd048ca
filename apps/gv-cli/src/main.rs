use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use gv_app::{AppError, AppResult, CircuitService, SimState};
use gv_components::format_value;

#[derive(Parser)]
#[command(name = "gv-cli")]
#[command(about = "GridVolt CLI - grid-based analog circuit simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a circuit script and show its compiled node graph
    Validate {
        /// Path to the circuit script
        script_path: PathBuf,
    },
    /// Run a circuit headless and print the final state
    Run {
        /// Path to the circuit script
        script_path: PathBuf,
        /// Simulated run duration in seconds (overrides the script)
        #[arg(long)]
        duration: Option<f64>,
        /// Time step in seconds (overrides the script and auto-derivation)
        #[arg(long)]
        dt: Option<f64>,
        /// Disable the DC source ramp-up
        #[arg(long)]
        no_ramp: bool,
        /// Write the final step record as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a circuit and export step records at a fixed step interval
    ExportSeries {
        /// Path to the circuit script
        script_path: PathBuf,
        /// Simulated run duration in seconds (overrides the script)
        #[arg(long)]
        duration: Option<f64>,
        /// Steps between exported records
        #[arg(long, default_value_t = 100)]
        every: u64,
        /// Output file (JSON lines), defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate { script_path } => cmd_validate(&script_path),
        Commands::Run {
            script_path,
            duration,
            dt,
            no_ramp,
            output,
        } => cmd_run(&script_path, duration, dt, no_ramp, output.as_deref()),
        Commands::ExportSeries {
            script_path,
            duration,
            every,
            output,
        } => cmd_export_series(&script_path, duration, every, output.as_deref()),
    }
}

fn cmd_validate(script_path: &Path) -> AppResult<()> {
    println!("Validating circuit: {}", script_path.display());
    let (sch, _params) = gv_project::load_script(script_path)?;
    let graph = gv_graph::compile(&sch).map_err(AppError::from)?;

    println!("✓ Circuit is valid");
    println!("  Components: {}", sch.components().count());
    println!("  Nodes: {}", graph.nodes().len());
    for node in graph.nodes() {
        let labels: Vec<String> = node.locations.iter().map(|l| l.label()).collect();
        let tag = if node.ground { " (ground)" } else { "" };
        println!("  node {}: {}{}", node.id, labels.join(" "), tag);
    }
    Ok(())
}

fn load_for_run(
    script_path: &Path,
    duration: Option<f64>,
    dt: Option<f64>,
    no_ramp: bool,
) -> AppResult<CircuitService> {
    let svc = CircuitService::new();
    svc.load_script(script_path)?;
    svc.update_params(|p| {
        if let Some(d) = duration {
            p.run_duration_s = Some(d);
        }
        if let Some(dt) = dt {
            p.dt_s = Some(dt);
        }
        if no_ramp {
            p.dc_ramp = false;
        }
    });
    if svc.params().run_duration_s.is_none() {
        return Err(AppError::InvalidInput(
            "no run duration: pass --duration or add `set duration` to the script".into(),
        ));
    }
    Ok(svc)
}

fn wait_for_stop(svc: &CircuitService) {
    while svc.state() == SimState::Running {
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn cmd_run(
    script_path: &Path,
    duration: Option<f64>,
    dt: Option<f64>,
    no_ramp: bool,
    output: Option<&Path>,
) -> AppResult<()> {
    let svc = load_for_run(script_path, duration, dt, no_ramp)?;
    println!("Running circuit: {}", script_path.display());

    svc.run()?;
    wait_for_stop(&svc);

    println!("✓ Run complete: t = {:.6} s", svc.sim_time_s());
    let failed = svc.failed_steps();
    if failed > 0 {
        println!("  ⚠ {} step(s) hit the iteration cap", failed);
    }

    println!("Nodes:");
    for node in svc.node_samples() {
        let tag = if node.ground { " (ground)" } else { "" };
        println!(
            "  {:<12} {}V{}",
            node.locations.join(" "),
            format_value(node.voltage_v),
            tag
        );
    }
    println!("Components:");
    for comp in svc.component_samples() {
        println!(
            "  {:<10} {}A  {}W",
            comp.kind,
            format_value(comp.current_a),
            format_value(comp.power_w)
        );
    }

    if let Some(path) = output {
        let record = svc.snapshot()?;
        gv_app::write_json_lines(path, std::slice::from_ref(&record))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_export_series(
    script_path: &Path,
    duration: Option<f64>,
    every: u64,
    output: Option<&Path>,
) -> AppResult<()> {
    if every == 0 {
        return Err(AppError::InvalidInput("--every must be positive".into()));
    }
    let svc = load_for_run(script_path, duration, None, false)?;
    let t_end = svc.params().run_duration_s.unwrap_or_default();

    let mut records = Vec::new();
    while svc.sim_time_s() < t_end {
        svc.step(every)?;
        wait_for_stop(&svc);
        records.push(svc.snapshot()?);
    }

    match output {
        Some(path) => {
            gv_app::write_json_lines(path, &records)?;
            println!("Wrote {} record(s) to {}", records.len(), path.display());
        }
        None => print!("{}", gv_app::to_json_lines(&records)?),
    }
    Ok(())
}
