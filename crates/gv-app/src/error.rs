//! Error types for the gv-app service layer.

/// Application error wrapping the backend crates behind one interface for
/// CLI and GUI callers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Component error: {0}")]
    Component(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gv-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<gv_graph::GraphError> for AppError {
    fn from(err: gv_graph::GraphError) -> Self {
        AppError::Topology(err.to_string())
    }
}

impl From<gv_components::ComponentError> for AppError {
    fn from(err: gv_components::ComponentError) -> Self {
        AppError::Component(err.to_string())
    }
}

impl From<gv_core::GvError> for AppError {
    fn from(err: gv_core::GvError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<gv_solver::SolverError> for AppError {
    fn from(err: gv_solver::SolverError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<gv_sim::SimError> for AppError {
    fn from(err: gv_sim::SimError) -> Self {
        match err {
            gv_sim::SimError::Compile(e) => AppError::Topology(e.to_string()),
            other => AppError::Simulation(other.to_string()),
        }
    }
}

impl From<gv_project::ProjectError> for AppError {
    fn from(err: gv_project::ProjectError) -> Self {
        match err {
            gv_project::ProjectError::Io(e) => AppError::Io(e),
            other => AppError::Script(other.to_string()),
        }
    }
}
