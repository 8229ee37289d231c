//! Violations found while validating a workflow definition.

use thiserror::Error;

/// A single structural problem in a definition.
///
/// Construction collects every violation before failing, so one error
/// reports the whole list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionViolation {
    #[error("definition declares no places")]
    NoPlaces,

    #[error("place names must not be empty")]
    EmptyPlaceName,

    #[error("place '{place}' is declared more than once")]
    DuplicatePlace { place: String },

    #[error("a transition has an empty name")]
    EmptyTransitionName,

    #[error("transition '{transition}' has no {side} places")]
    EmptyArcs {
        transition: String,
        side: &'static str,
    },

    #[error("transition '{transition}' references unknown place '{place}'")]
    UnknownPlace { transition: String, place: String },

    #[error("initial place '{place}' is not declared")]
    UnknownInitialPlace { place: String },

    #[error(
        "state machine transition '{transition}' must have exactly one from and one to place \
         (got {from} from, {to} to)"
    )]
    StateMachineArity {
        transition: String,
        from: usize,
        to: usize,
    },

    #[error("state machine may declare at most one initial place (got {count})")]
    StateMachineInitialPlaces { count: usize },
}
