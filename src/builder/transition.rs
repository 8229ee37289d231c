//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::Transition;

/// Builder for constructing transitions with a fluent API.
#[derive(Debug, Clone, Default)]
pub struct TransitionBuilder {
    name: String,
    from: Vec<String>,
    to: Vec<String>,
    guard: Option<String>,
}

impl TransitionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a source place (at least one is required).
    pub fn from(mut self, place: impl Into<String>) -> Self {
        self.from.push(place.into());
        self
    }

    /// Add a target place (at least one is required).
    pub fn to(mut self, place: impl Into<String>) -> Self {
        self.to.push(place.into());
        self
    }

    /// Guard the transition with an expression for the guard listener.
    pub fn guard(mut self, expression: impl Into<String>) -> Self {
        self.guard = Some(expression.into());
        self
    }

    pub fn build(self) -> Result<Transition, BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::MissingName);
        }
        if self.from.is_empty() {
            return Err(BuildError::MissingFromPlace {
                transition: self.name,
            });
        }
        if self.to.is_empty() {
            return Err(BuildError::MissingToPlace {
                transition: self.name,
            });
        }

        let transition = Transition::new(self.name, self.from, self.to);
        Ok(match self.guard {
            Some(expression) => transition.with_guard(expression),
            None => transition,
        })
    }
}
