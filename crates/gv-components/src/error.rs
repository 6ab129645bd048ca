//! Error types for component definitions.

use gv_core::error::GvError;
use thiserror::Error;

/// Errors that can occur while defining or parsing components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid value string: {text}")]
    InvalidValue { text: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<ComponentError> for GvError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NonPhysical { what } => GvError::InvalidArg { what },
            ComponentError::InvalidValue { text: _ } => GvError::InvalidArg {
                what: "value string",
            },
            ComponentError::InvalidArg { what } => GvError::InvalidArg { what },
        }
    }
}
