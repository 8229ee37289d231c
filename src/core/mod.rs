//! Core engine types.
//!
//! This module contains the pure part of the engine:
//! - Definitions of places and transitions, validated at construction
//! - Markings, the set of active places of one subject
//! - Guard predicates and the context they are evaluated in
//! - Immutable transition history
//!
//! Nothing here performs I/O or dispatches events.

mod definition;
mod guard;
mod history;
mod marking;
mod violations;

pub use definition::{Definition, Transition, WorkflowType};
pub use guard::{Guard, GuardContext, GuardError, SecurityContext};
pub use history::{TransitionHistory, TransitionRecord};
pub use marking::{Marking, PlaceMetadata};
pub use violations::DefinitionViolation;
