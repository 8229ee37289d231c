//! Builder for constructing definitions.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Definition, Transition, WorkflowType};
use crate::error::Result;

/// Builder for constructing definitions with a fluent API.
///
/// For state machines, a transition with several source or target places
/// is expanded into one transition per (from, to) pair, all sharing the
/// transition's name and guard.
///
/// # Example
///
/// ```
/// use placemark::builder::DefinitionBuilder;
///
/// let definition = DefinitionBuilder::state_machine()
///     .places(["todo", "doing", "done", "dropped"])
///     .transition("finish", ["doing"], ["done"])
///     .transition("drop", ["todo", "doing"], ["dropped"])
///     .initial_place("todo")
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.transitions_named("drop").count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefinitionBuilder {
    workflow_type: WorkflowType,
    places: Vec<String>,
    transitions: Vec<Transition>,
    initial_places: Vec<String>,
}

impl DefinitionBuilder {
    /// Start a Petri-net workflow definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a state machine definition.
    pub fn state_machine() -> Self {
        Self::new().workflow_type(WorkflowType::StateMachine)
    }

    pub fn workflow_type(mut self, workflow_type: WorkflowType) -> Self {
        self.workflow_type = workflow_type;
        self
    }

    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.places.push(place.into());
        self
    }

    pub fn places<P: Into<String>>(mut self, places: impl IntoIterator<Item = P>) -> Self {
        self.places.extend(places.into_iter().map(Into::into));
        self
    }

    /// Add an unguarded transition.
    pub fn transition<F, T>(
        self,
        name: impl Into<String>,
        from: impl IntoIterator<Item = F>,
        to: impl IntoIterator<Item = T>,
    ) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        self.add_transition(Transition::new(name, from, to))
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition_with(self, builder: TransitionBuilder) -> std::result::Result<Self, BuildError> {
        Ok(self.add_transition(builder.build()?))
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn initial_place(mut self, place: impl Into<String>) -> Self {
        self.initial_places.push(place.into());
        self
    }

    pub fn initial_places<P: Into<String>>(mut self, places: impl IntoIterator<Item = P>) -> Self {
        self.initial_places.extend(places.into_iter().map(Into::into));
        self
    }

    /// Build and validate the definition.
    pub fn build(self) -> Result<Definition> {
        let transitions = match self.workflow_type {
            WorkflowType::StateMachine => expand_arcs(self.transitions),
            WorkflowType::Workflow => self.transitions,
        };

        Definition::new(self.workflow_type, self.places, transitions, self.initial_places)
    }
}

/// One single-arc transition per (from, to) pair, in from-major order.
fn expand_arcs(transitions: Vec<Transition>) -> Vec<Transition> {
    let mut expanded = Vec::with_capacity(transitions.len());
    for transition in transitions {
        let single = transition.from().len() <= 1 && transition.to().len() <= 1;
        if single || transition.from().is_empty() || transition.to().is_empty() {
            expanded.push(transition);
            continue;
        }

        for from in transition.from() {
            for to in transition.to() {
                let arc = Transition::new(transition.name(), [from.as_str()], [to.as_str()]);
                expanded.push(match transition.guard() {
                    Some(expression) => arc.with_guard(expression),
                    None => arc,
                });
            }
        }
    }
    expanded
}
