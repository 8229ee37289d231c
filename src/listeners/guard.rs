//! Expression-based guards.

use crate::core::{GuardContext, GuardError, SecurityContext};
use crate::event::{Event, EventBus, Listener, ListenerError};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Evaluates guard expressions. The expression language is up to the host.
pub trait GuardEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, context: &GuardContext<'_>) -> Result<bool, GuardError>;
}

impl<F> GuardEvaluator for F
where
    F: Fn(&str, &GuardContext<'_>) -> Result<bool, GuardError> + Send + Sync,
{
    fn evaluate(&self, expression: &str, context: &GuardContext<'_>) -> Result<bool, GuardError> {
        self(expression, context)
    }
}

/// Blocks guard events whose expression evaluates to `false`.
///
/// Two sources of expressions, both keyed by guard event name
/// (`workflow.<name>.guard.<transition>`):
///
/// - [`with_transition_guards`](Self::with_transition_guards): evaluate the
///   expression carried by the candidate transition itself, so same-named
///   arcs keep their own guards;
/// - [`with_guard`](Self::with_guard): one fixed expression per event name,
///   used for candidates that carry none.
///
/// # Example
///
/// ```rust
/// use placemark::core::{GuardContext, GuardError};
/// use placemark::event::EventBus;
/// use placemark::listeners::GuardListener;
/// use std::sync::Arc;
///
/// let evaluator = |expression: &str, _: &GuardContext<'_>| -> Result<bool, GuardError> {
///     Ok(expression == "true")
/// };
/// let listener = GuardListener::new(Arc::new(evaluator))
///     .with_guard("workflow.blog.guard.publish", "false");
///
/// let bus = EventBus::new();
/// Arc::new(listener).subscribe(&bus);
/// assert!(bus.has_listeners("workflow.blog.guard.publish"));
/// ```
pub struct GuardListener {
    expressions: HashMap<String, String>,
    declared: BTreeSet<String>,
    evaluator: Arc<dyn GuardEvaluator>,
    security: Option<Arc<dyn SecurityContext>>,
}

impl GuardListener {
    pub fn new(evaluator: Arc<dyn GuardEvaluator>) -> Self {
        Self {
            expressions: HashMap::new(),
            declared: BTreeSet::new(),
            evaluator,
            security: None,
        }
    }

    pub fn with_security(mut self, security: Arc<dyn SecurityContext>) -> Self {
        self.security = Some(security);
        self
    }

    /// Guard the event `event_name` with `expression`, replacing any
    /// expression already set for it.
    pub fn with_guard(mut self, event_name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.expressions.insert(event_name.into(), expression.into());
        self
    }

    /// On `event_name`, evaluate the guard expression of the candidate
    /// transition being checked.
    pub fn with_transition_guards(mut self, event_name: impl Into<String>) -> Self {
        self.declared.insert(event_name.into());
        self
    }

    pub fn expression(&self, event_name: &str) -> Option<&str> {
        self.expressions.get(event_name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty() && self.declared.is_empty()
    }

    /// Subscribe to every guarded event name.
    pub fn subscribe(self: Arc<Self>, bus: &EventBus) {
        let names: BTreeSet<_> = self
            .expressions
            .keys()
            .chain(self.declared.iter())
            .cloned()
            .collect();
        for name in names {
            bus.subscribe(name, Arc::clone(&self) as Arc<dyn Listener>);
        }
    }
}

impl Listener for GuardListener {
    fn handle(&self, event: &mut Event<'_>) -> Result<(), ListenerError> {
        let name = event.transition_event_name();
        let carried = event
            .transition()
            .guard()
            .filter(|_| self.declared.contains(&name));
        let Some(expression) = carried.or_else(|| self.expression(&name)) else {
            return Ok(());
        };

        let context = GuardContext {
            workflow: event.workflow(),
            subject: event.subject(),
            marking: event.marking(),
            transition: event.transition(),
            security: self.security.as_deref(),
        };

        let allowed = self
            .evaluator
            .evaluate(expression, &context)
            .map_err(|e| ListenerError::GuardEvaluation {
                expression: e.expression,
                reason: e.reason,
            })?;

        if !allowed {
            debug!(event = %name, expression = %expression, "guard expression denied transition");
            event.block();
        }
        Ok(())
    }
}

impl fmt::Debug for GuardListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardListener")
            .field("expressions", &self.expressions)
            .field("declared", &self.declared)
            .field("security", &self.security.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Marking, Transition};
    use crate::event::{EventDispatcher, Phase};
    use crate::impl_subject;
    use crate::subject::Subject;

    struct Post;

    impl_subject!(Post as "Post");

    struct Roles(Vec<String>);

    impl SecurityContext for Roles {
        fn is_authenticated(&self) -> bool {
            !self.0.is_empty()
        }

        fn roles(&self) -> Vec<String> {
            self.0.clone()
        }

        fn is_granted(&self, attribute: &str, _subject: Option<&dyn Subject>) -> bool {
            self.0.iter().any(|r| r == attribute)
        }
    }

    /// Understands `true`, `false` and `has_role('<ROLE>')`.
    fn evaluator() -> Arc<dyn GuardEvaluator> {
        Arc::new(|expression: &str, ctx: &GuardContext<'_>| -> Result<bool, GuardError> {
            match expression {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => {
                    let role = expression
                        .strip_prefix("has_role('")
                        .and_then(|rest| rest.strip_suffix("')"))
                        .ok_or_else(|| GuardError::new(expression, "syntax error"))?;
                    Ok(ctx.security.is_some_and(|s| s.is_granted(role, Some(ctx.subject))))
                }
            }
        })
    }

    fn check_arc(bus: &EventBus, transition: &Transition) -> Result<bool, ListenerError> {
        let marking = Marking::from_places(transition.from().iter().cloned());
        let mut event = Event::new("blog", Phase::Guard, &Post, &marking, transition);
        let name = event.transition_event_name();
        bus.dispatch(&name, &mut event)?;
        Ok(event.is_blocked())
    }

    fn check(bus: &EventBus, transition: &str) -> Result<bool, ListenerError> {
        check_arc(bus, &Transition::new(transition, ["draft"], ["published"]))
    }

    #[test]
    fn false_expression_blocks() {
        let bus = EventBus::new();
        Arc::new(
            GuardListener::new(evaluator())
                .with_guard("workflow.blog.guard.publish", "false")
                .with_guard("workflow.blog.guard.review", "true"),
        )
        .subscribe(&bus);

        assert_eq!(check(&bus, "publish"), Ok(true));
        assert_eq!(check(&bus, "review"), Ok(false));
        assert_eq!(check(&bus, "archive"), Ok(false));
    }

    #[test]
    fn expressions_see_the_security_context() {
        let bus = EventBus::new();
        let security = Arc::new(Roles(vec!["ROLE_EDITOR".to_string()]));
        Arc::new(
            GuardListener::new(evaluator())
                .with_security(security)
                .with_guard("workflow.blog.guard.publish", "has_role('ROLE_EDITOR')")
                .with_guard("workflow.blog.guard.delete", "has_role('ROLE_ADMIN')"),
        )
        .subscribe(&bus);

        assert_eq!(check(&bus, "publish"), Ok(false));
        assert_eq!(check(&bus, "delete"), Ok(true));
    }

    #[test]
    fn missing_security_context_denies_role_checks() {
        let bus = EventBus::new();
        Arc::new(
            GuardListener::new(evaluator())
                .with_guard("workflow.blog.guard.publish", "has_role('ROLE_EDITOR')"),
        )
        .subscribe(&bus);

        assert_eq!(check(&bus, "publish"), Ok(true));
    }

    #[test]
    fn evaluation_errors_propagate() {
        let bus = EventBus::new();
        Arc::new(
            GuardListener::new(evaluator()).with_guard("workflow.blog.guard.publish", "nonsense("),
        )
        .subscribe(&bus);

        assert_eq!(
            check(&bus, "publish"),
            Err(ListenerError::GuardEvaluation {
                expression: "nonsense(".to_string(),
                reason: "syntax error".to_string(),
            })
        );
    }

    #[test]
    fn same_named_arcs_keep_their_own_guards() {
        let bus = EventBus::new();
        Arc::new(GuardListener::new(evaluator()).with_transition_guards("workflow.blog.guard.next"))
            .subscribe(&bus);

        let closed = Transition::new("next", ["a"], ["b"]).with_guard("false");
        let open = Transition::new("next", ["c"], ["d"]).with_guard("true");
        let bare = Transition::new("next", ["e"], ["f"]);

        assert_eq!(check_arc(&bus, &closed), Ok(true));
        assert_eq!(check_arc(&bus, &open), Ok(false));
        assert_eq!(check_arc(&bus, &bare), Ok(false));
    }

    #[test]
    fn carried_guard_wins_over_fixed_expression() {
        let bus = EventBus::new();
        Arc::new(
            GuardListener::new(evaluator())
                .with_guard("workflow.blog.guard.next", "false")
                .with_transition_guards("workflow.blog.guard.next"),
        )
        .subscribe(&bus);

        let open = Transition::new("next", ["c"], ["d"]).with_guard("true");
        let bare = Transition::new("next", ["e"], ["f"]);

        assert_eq!(bus.listener_count("workflow.blog.guard.next"), 1);
        assert_eq!(check_arc(&bus, &open), Ok(false));
        assert_eq!(check_arc(&bus, &bare), Ok(true));
    }

    #[test]
    fn carried_guards_are_ignored_on_unwatched_events() {
        let bus = EventBus::new();
        Arc::new(GuardListener::new(evaluator()).with_transition_guards("workflow.blog.guard.next"))
            .subscribe(&bus);

        let other = Transition::new("publish", ["a"], ["b"]).with_guard("false");

        assert_eq!(check_arc(&bus, &other), Ok(false));
    }

    #[test]
    fn later_guard_replaces_earlier_one() {
        let listener = GuardListener::new(evaluator())
            .with_guard("workflow.blog.guard.publish", "false")
            .with_guard("workflow.blog.guard.publish", "true");

        assert_eq!(listener.expression("workflow.blog.guard.publish"), Some("true"));
        assert!(!listener.is_empty());
    }
}
