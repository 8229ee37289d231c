//! Immutable workflow definitions.
//!
//! A definition is the graph of places and transitions shared by every
//! subject of one workflow type. It is validated once, at construction,
//! and never mutated afterwards.

use super::violations::DefinitionViolation;
use crate::error::{Result, WorkflowError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Flavor of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Petri-net semantics: transitions may fork and join over several places.
    #[default]
    Workflow,
    /// One active place at a time: every transition has one from and one to place.
    StateMachine,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::StateMachine => "state_machine",
        }
    }
}

/// A named move consuming the `from` places and producing the `to` places.
///
/// Names are not unique: several transitions may share one name, each
/// describing an alternative arc of the same logical step.
///
/// # Example
///
/// ```rust
/// use placemark::core::Transition;
///
/// let join = Transition::new("merge", ["left", "right"], ["merged"]);
/// assert_eq!(join.from(), ["left", "right"]);
/// assert_eq!(join.to(), ["merged"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    name: String,
    from: Vec<String>,
    to: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    guard: Option<String>,
}

impl Transition {
    pub fn new<N, F, T>(
        name: N,
        from: impl IntoIterator<Item = F>,
        to: impl IntoIterator<Item = T>,
    ) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            from: from.into_iter().map(Into::into).collect(),
            to: to.into_iter().map(Into::into).collect(),
            guard: None,
        }
    }

    /// Attach a guard expression, handed to the guard listener on every check.
    pub fn with_guard(mut self, expression: impl Into<String>) -> Self {
        self.guard = Some(expression.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn from(&self) -> &[String] {
        &self.from
    }

    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }
}

/// Places, transitions and initial places of one workflow type.
///
/// # Example
///
/// ```rust
/// use placemark::core::{Definition, Transition, WorkflowType};
///
/// let definition = Definition::new(
///     WorkflowType::StateMachine,
///     ["draft", "reviewed", "published"],
///     vec![
///         Transition::new("review", ["draft"], ["reviewed"]),
///         Transition::new("publish", ["reviewed"], ["published"]),
///     ],
///     ["draft"],
/// )
/// .unwrap();
///
/// assert_eq!(definition.places().len(), 3);
/// assert!(Definition::new(WorkflowType::Workflow, ["a"], vec![
///     Transition::new("go", ["a"], ["b"]),
/// ], Vec::<String>::new()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    workflow_type: WorkflowType,
    places: Vec<String>,
    transitions: Vec<Transition>,
    initial_places: Vec<String>,
}

impl Definition {
    /// Validate and build a definition.
    ///
    /// Fails with [`WorkflowError::InvalidDefinition`] carrying every
    /// violation found, not only the first.
    pub fn new<P, I>(
        workflow_type: WorkflowType,
        places: impl IntoIterator<Item = P>,
        transitions: Vec<Transition>,
        initial_places: impl IntoIterator<Item = I>,
    ) -> Result<Self>
    where
        P: Into<String>,
        I: Into<String>,
    {
        let definition = Self {
            workflow_type,
            places: places.into_iter().map(Into::into).collect(),
            transitions,
            initial_places: initial_places.into_iter().map(Into::into).collect(),
        };

        match definition.validate() {
            Validation::Success(()) => Ok(definition),
            Validation::Failure(violations) => Err(WorkflowError::InvalidDefinition {
                violations: violations.iter().cloned().collect(),
            }),
        }
    }

    pub fn workflow_type(&self) -> WorkflowType {
        self.workflow_type
    }

    pub fn places(&self) -> &[String] {
        &self.places
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn initial_places(&self) -> &[String] {
        &self.initial_places
    }

    pub fn has_place(&self, place: &str) -> bool {
        self.places.iter().any(|p| p == place)
    }

    /// Transitions carrying `name`, in definition order.
    pub fn transitions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions.iter().filter(move |t| t.name == name)
    }

    fn validate(&self) -> Validation<(), NonEmptyVec<DefinitionViolation>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<DefinitionViolation>>> = Vec::new();

        if self.places.is_empty() {
            checks.push(Validation::fail(DefinitionViolation::NoPlaces));
        }

        let mut seen = HashSet::new();
        for place in &self.places {
            if place.is_empty() {
                checks.push(Validation::fail(DefinitionViolation::EmptyPlaceName));
            } else if !seen.insert(place.as_str()) {
                checks.push(Validation::fail(DefinitionViolation::DuplicatePlace {
                    place: place.clone(),
                }));
            }
        }

        for transition in &self.transitions {
            checks.extend(self.check_transition(transition));
        }

        for place in &self.initial_places {
            if !seen.contains(place.as_str()) {
                checks.push(Validation::fail(DefinitionViolation::UnknownInitialPlace {
                    place: place.clone(),
                }));
            }
        }

        if self.workflow_type == WorkflowType::StateMachine && self.initial_places.len() > 1 {
            checks.push(Validation::fail(
                DefinitionViolation::StateMachineInitialPlaces {
                    count: self.initial_places.len(),
                },
            ));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    fn check_transition(
        &self,
        transition: &Transition,
    ) -> Vec<Validation<(), NonEmptyVec<DefinitionViolation>>> {
        let mut checks = Vec::new();

        if transition.name.is_empty() {
            checks.push(Validation::fail(DefinitionViolation::EmptyTransitionName));
        }

        for (side, places) in [("from", &transition.from), ("to", &transition.to)] {
            if places.is_empty() {
                checks.push(Validation::fail(DefinitionViolation::EmptyArcs {
                    transition: transition.name.clone(),
                    side,
                }));
            }
            for place in places {
                if !self.has_place(place) {
                    checks.push(Validation::fail(DefinitionViolation::UnknownPlace {
                        transition: transition.name.clone(),
                        place: place.clone(),
                    }));
                }
            }
        }

        if self.workflow_type == WorkflowType::StateMachine
            && (transition.from.len() != 1 || transition.to.len() != 1)
        {
            checks.push(Validation::fail(DefinitionViolation::StateMachineArity {
                transition: transition.name.clone(),
                from: transition.from.len(),
                to: transition.to.len(),
            }));
        }

        checks
    }
}
