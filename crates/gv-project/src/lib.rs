//! gv-project: the circuit script format.
//!
//! A circuit persists as a flat command script, one line per component,
//! followed by an optional ground line and parameter settings:
//!
//! ```text
//! power aa ca 12
//! resistor aa ba 1
//! resistor ba ca 2
//! ground ca
//! set dt 1m
//! ```

pub mod script;

pub use script::{read_script, write_script};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Script line {line}: {what}")]
    Parse { line: usize, what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load a circuit from a script file.
pub fn load_script(
    path: &std::path::Path,
) -> ProjectResult<(gv_graph::Schematic, gv_sim::SimParams)> {
    let content = std::fs::read_to_string(path)?;
    read_script(&content)
}

/// Save a circuit to a script file.
pub fn save_script(
    path: &std::path::Path,
    sch: &gv_graph::Schematic,
    params: &gv_sim::SimParams,
) -> ProjectResult<()> {
    std::fs::write(path, write_script(sch, params))?;
    Ok(())
}
