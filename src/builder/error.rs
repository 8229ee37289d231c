//! Build errors for definition, transition and workflow builders.

use crate::error::WorkflowError;
use thiserror::Error;

/// Errors that can occur when building definitions and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Transition name not specified. Call TransitionBuilder::new(name) with a non-empty name")]
    MissingName,

    #[error("Transition '{transition}' has no source place. Call .from(place)")]
    MissingFromPlace { transition: String },

    #[error("Transition '{transition}' has no target place. Call .to(place)")]
    MissingToPlace { transition: String },

    #[error("{places} places need {expected} steps, got {steps}")]
    StepCountMismatch {
        places: usize,
        expected: usize,
        steps: usize,
    },

    #[error(transparent)]
    Definition(#[from] WorkflowError),
}
