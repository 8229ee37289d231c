//! Engine error type.

use crate::core::DefinitionViolation;
use crate::event::ListenerError;
use crate::subject::PropertyError;
use thiserror::Error;

/// Errors raised by definitions, workflows, marking stores and the registry.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The definition is structurally invalid. Raised at construction only.
    #[error("invalid workflow definition: {}", join(.violations))]
    InvalidDefinition { violations: Vec<DefinitionViolation> },

    /// A marking names a place the definition does not declare.
    #[error("workflow '{workflow}' has no place '{place}'")]
    UnknownPlace { workflow: String, place: String },

    #[error("workflow '{workflow}' has no transition '{transition}'")]
    UnknownTransition {
        workflow: String,
        transition: String,
    },

    /// No candidate is both structurally enabled and guard-approved.
    #[error("transition '{transition}' is not enabled in workflow '{workflow}'")]
    NotEnabled {
        workflow: String,
        transition: String,
    },

    /// The marking store cannot represent this marking.
    #[error("marking store cannot persist {} marked places: {}", .places.len(), .places.join(", "))]
    UnsupportedMarking { places: Vec<String> },

    #[error("no workflow supports subject of type '{subject}'")]
    NoMatch { subject: String },

    #[error("subject of type '{subject}' is supported by several workflows: {}", .candidates.join(", "))]
    AmbiguousMatch {
        subject: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Property(#[from] PropertyError),
}

fn join(violations: &[DefinitionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, WorkflowError>;
