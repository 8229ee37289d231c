//! Guard predicates for vetoing transitions.
//!
//! Guards are pure boolean functions consulted before a transition may
//! fire. Any guard returning `false` blocks the transition; there is no
//! majority vote.

use super::definition::Transition;
use super::marking::Marking;
use crate::subject::Subject;
use std::sync::Arc;
use thiserror::Error;

/// Authorization capability consulted by guards.
///
/// The engine never implements authorization itself; hosts inject one.
pub trait SecurityContext: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn roles(&self) -> Vec<String>;

    /// Whether the current principal holds `attribute`, optionally on `subject`.
    fn is_granted(&self, attribute: &str, subject: Option<&dyn Subject>) -> bool;
}

/// What a guard sees when it is asked about one candidate transition.
#[derive(Clone, Copy)]
pub struct GuardContext<'a> {
    pub workflow: &'a str,
    pub subject: &'a dyn Subject,
    pub marking: &'a Marking,
    pub transition: &'a Transition,
    pub security: Option<&'a dyn SecurityContext>,
}

/// Failure to evaluate a guard expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot evaluate guard expression '{expression}': {reason}")]
pub struct GuardError {
    pub expression: String,
    pub reason: String,
}

impl GuardError {
    pub fn new(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

/// Pure predicate that decides whether a transition may fire.
///
/// # Example
///
/// ```rust
/// use placemark::core::{Guard, GuardContext, Marking, Transition};
/// use placemark::impl_subject;
///
/// struct Article {
///     approved: bool,
/// }
///
/// impl_subject!(Article as "Article");
///
/// let guard = Guard::new(|ctx: &GuardContext<'_>| {
///     ctx.subject
///         .as_any()
///         .downcast_ref::<Article>()
///         .is_some_and(|a| a.approved)
/// });
///
/// let transition = Transition::new("publish", ["reviewed"], ["published"]);
/// let marking = Marking::from_places(["reviewed"]);
/// let article = Article { approved: true };
/// let ctx = GuardContext {
///     workflow: "blog",
///     subject: &article,
///     marking: &marking,
///     transition: &transition,
///     security: None,
/// };
///
/// assert!(guard.check(&ctx));
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Arc<dyn Fn(&GuardContext<'_>) -> bool + Send + Sync>,
}

impl Guard {
    /// Create a guard from a pure, thread-safe predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&GuardContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Guard that only looks at the subject.
    pub fn on_subject<F>(predicate: F) -> Self
    where
        F: Fn(&dyn Subject) -> bool + Send + Sync + 'static,
    {
        Self::new(move |ctx| predicate(ctx.subject))
    }

    pub fn check(&self, context: &GuardContext<'_>) -> bool {
        (self.predicate)(context)
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
