//! Workflows: a definition bound to a marking store and an event dispatcher.
//!
//! A [`Workflow`] holds no per-subject state. Every call reads the subject's
//! marking from the store, so one workflow serves any number of subjects
//! from any number of threads.

mod enabled;

pub use enabled::EnabledTransitions;

use crate::core::{Definition, Guard, GuardContext, Marking, SecurityContext, Transition};
use crate::error::{Result, WorkflowError};
use crate::event::{Event, EventDispatcher, Phase};
use crate::store::MarkingStore;
use crate::subject::Subject;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Executes transitions of one definition against subjects.
pub struct Workflow {
    name: String,
    definition: Arc<Definition>,
    store: Arc<dyn MarkingStore>,
    dispatcher: Option<Arc<dyn EventDispatcher>>,
    guards: HashMap<String, Vec<Guard>>,
    security: Option<Arc<dyn SecurityContext>>,
}

impl Workflow {
    /// Bind a definition to a store. Use [`WorkflowBuilder`](crate::builder::WorkflowBuilder)
    /// to attach a dispatcher or guards.
    pub fn new(
        name: impl Into<String>,
        definition: Arc<Definition>,
        store: Arc<dyn MarkingStore>,
    ) -> Self {
        Self {
            name: name.into(),
            definition,
            store,
            dispatcher: None,
            guards: HashMap::new(),
            security: None,
        }
    }

    pub(crate) fn with_parts(
        name: String,
        definition: Arc<Definition>,
        store: Arc<dyn MarkingStore>,
        dispatcher: Option<Arc<dyn EventDispatcher>>,
        guards: HashMap<String, Vec<Guard>>,
    ) -> Self {
        Self {
            name,
            definition,
            store,
            dispatcher,
            guards,
            security: None,
        }
    }

    pub(crate) fn with_security(mut self, security: Option<Arc<dyn SecurityContext>>) -> Self {
        self.security = security;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn marking_store(&self) -> &dyn MarkingStore {
        self.store.as_ref()
    }

    /// Current marking of `subject`.
    ///
    /// An empty stored marking starts at the definition's initial places;
    /// that initial marking is not persisted. Fails with
    /// [`WorkflowError::UnknownPlace`] if the stored marking names a place
    /// the definition lacks.
    pub fn marking(&self, subject: &dyn Subject) -> Result<Marking> {
        let mut marking = self.store.get_marking(subject)?;

        if marking.is_empty() {
            for place in self.definition.initial_places() {
                marking.mark(place.as_str());
            }
        }

        self.check_places(&marking)?;
        Ok(marking)
    }

    /// Like [`marking`](Self::marking), but persists the initial marking
    /// when the subject had none.
    pub fn initialize(&self, subject: &mut dyn Subject) -> Result<Marking> {
        let stored = self.store.get_marking(subject)?;
        if !stored.is_empty() {
            self.check_places(&stored)?;
            return Ok(stored);
        }

        let marking = Marking::from_places(self.definition.initial_places().iter().cloned());
        if !marking.is_empty() {
            self.store.set_marking(subject, &marking)?;
            debug!(workflow = %self.name, subject = subject.type_name(), "initialized marking");
        }
        Ok(marking)
    }

    /// Whether `transition` can be applied to `subject` now.
    ///
    /// True iff some transition with that name has every from-place marked
    /// and is not vetoed by a guard. Only `guard` events are dispatched.
    pub fn can(&self, subject: &dyn Subject, transition: &str) -> Result<bool> {
        let candidates = self.candidates(transition)?;
        let marking = self.marking(subject)?;

        for candidate in candidates {
            if self.is_enabled(subject, &marking, candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Lazily evaluate every transition, in definition order, against the
    /// subject's current marking.
    pub fn enabled_transitions<'a>(&'a self, subject: &'a dyn Subject) -> Result<EnabledTransitions<'a>> {
        let marking = self.marking(subject)?;
        Ok(EnabledTransitions::new(self, subject, marking))
    }

    /// Fire `transition` on `subject` and persist the resulting marking.
    ///
    /// Uses the first enabled candidate in definition order. Events are
    /// dispatched synchronously: `leave` per from-place, `transition`,
    /// `enter` per to-place, then the marking is persisted, then `entered`
    /// per to-place. A listener error aborts the call; before persistence
    /// nothing has been written.
    pub fn apply(&self, subject: &mut dyn Subject, transition: &str) -> Result<Marking> {
        let candidates = self.candidates(transition)?;
        let mut marking = self.marking(subject)?;

        let mut chosen = None;
        for candidate in candidates {
            if self.is_enabled(&*subject, &marking, candidate)? {
                chosen = Some(candidate);
                break;
            }
        }
        let Some(transition) = chosen else {
            debug!(workflow = %self.name, transition, "transition not enabled");
            return Err(WorkflowError::NotEnabled {
                workflow: self.name.clone(),
                transition: transition.to_string(),
            });
        };

        self.leave(&*subject, &mut marking, transition)?;
        self.emit(Phase::Transition, &*subject, &marking, transition, None)?;
        self.enter(&*subject, &mut marking, transition)?;

        self.store.set_marking(subject, &marking)?;
        debug!(
            workflow = %self.name,
            transition = transition.name(),
            marking = ?marking.places().collect::<Vec<_>>(),
            "applied transition"
        );

        for place in transition.to() {
            self.emit(Phase::Entered, &*subject, &marking, transition, Some(place.as_str()))?;
        }

        Ok(marking)
    }

    fn candidates<'a>(&'a self, name: &'a str) -> Result<impl Iterator<Item = &'a Transition> + 'a> {
        let mut candidates = self.definition.transitions_named(name).peekable();
        if candidates.peek().is_none() {
            return Err(WorkflowError::UnknownTransition {
                workflow: self.name.clone(),
                transition: name.to_string(),
            });
        }
        Ok(candidates)
    }

    /// Structural enablement, then the workflow's guards, then the guard event.
    pub(crate) fn is_enabled(
        &self,
        subject: &dyn Subject,
        marking: &Marking,
        transition: &Transition,
    ) -> Result<bool> {
        if !transition.from().iter().all(|place| marking.has(place)) {
            return Ok(false);
        }

        if let Some(guards) = self.guards.get(transition.name()) {
            let context = GuardContext {
                workflow: &self.name,
                subject,
                marking,
                transition,
                security: self.security.as_deref(),
            };
            if !guards.iter().all(|guard| guard.check(&context)) {
                debug!(workflow = %self.name, transition = transition.name(), "blocked by guard");
                return Ok(false);
            }
        }

        let blocked = self.emit(Phase::Guard, subject, marking, transition, None)?;
        if blocked {
            debug!(workflow = %self.name, transition = transition.name(), "blocked by guard listener");
        }
        Ok(!blocked)
    }

    fn leave(&self, subject: &dyn Subject, marking: &mut Marking, transition: &Transition) -> Result<()> {
        for place in transition.from() {
            self.emit(Phase::Leave, subject, marking, transition, Some(place.as_str()))?;
        }
        for place in transition.from() {
            marking.unmark(place);
        }
        Ok(())
    }

    fn enter(&self, subject: &dyn Subject, marking: &mut Marking, transition: &Transition) -> Result<()> {
        for place in transition.to() {
            marking.mark(place.as_str());
        }
        for place in transition.to() {
            self.emit(Phase::Enter, subject, marking, transition, Some(place.as_str()))?;
        }
        Ok(())
    }

    /// Dispatch one phase under both event names; returns the blocked flag.
    fn emit(
        &self,
        phase: Phase,
        subject: &dyn Subject,
        marking: &Marking,
        transition: &Transition,
        place: Option<&str>,
    ) -> Result<bool> {
        let Some(dispatcher) = &self.dispatcher else {
            return Ok(false);
        };

        let mut event = Event::new(&self.name, phase, subject, marking, transition);
        if let Some(place) = place {
            event = event.at_place(place);
        }

        dispatcher.dispatch(&event.workflow_event_name(), &mut event)?;
        dispatcher.dispatch(&event.transition_event_name(), &mut event)?;
        Ok(event.is_blocked())
    }

    fn check_places(&self, marking: &Marking) -> Result<()> {
        match marking.places().find(|place| !self.definition.has_place(place)) {
            Some(place) => Err(WorkflowError::UnknownPlace {
                workflow: self.name.clone(),
                place: place.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("definition", &self.definition)
            .field("dispatcher", &self.dispatcher.is_some())
            .field("guards", &self.guards.keys().collect::<Vec<_>>())
            .field("security", &self.security.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorkflowType;
    use crate::event::{EventBus, ListenerError};
    use crate::impl_subject;
    use crate::store::{MultipleStateStore, SingleStateStore};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct Article {
        marking: Option<Value>,
        approved: bool,
    }

    impl_subject!(Article as "Article" { marking });

    fn article(marking: Option<Value>) -> Article {
        Article {
            marking,
            approved: true,
        }
    }

    fn blog_definition() -> Arc<Definition> {
        Arc::new(
            Definition::new(
                WorkflowType::StateMachine,
                ["draft", "reviewed", "published"],
                vec![
                    Transition::new("review", ["draft"], ["reviewed"]),
                    Transition::new("publish", ["reviewed"], ["published"]),
                ],
                ["draft"],
            )
            .unwrap(),
        )
    }

    fn blog() -> Workflow {
        Workflow::new("blog", blog_definition(), Arc::new(SingleStateStore::default()))
    }

    fn recording_bus(log: &Arc<Mutex<Vec<String>>>) -> Arc<EventBus> {
        let bus = Arc::new(EventBus::new());
        for phase in Phase::ALL {
            let log = Arc::clone(log);
            bus.on(crate::event::workflow_event_name("w", phase), move |event: &mut Event<'_>| {
                let entry = match event.place() {
                    Some(place) => format!("{}:{}", event.phase(), place),
                    None => format!("{}:{}", event.phase(), event.transition().name()),
                };
                log.lock().unwrap().push(entry);
                Ok(())
            });
        }
        bus
    }

    #[test]
    fn review_then_publish() {
        let workflow = blog();
        let mut subject = article(Some(json!("draft")));

        assert!(workflow.can(&subject, "review").unwrap());
        assert!(!workflow.can(&subject, "publish").unwrap());

        let marking = workflow.apply(&mut subject, "review").unwrap();
        assert_eq!(marking, Marking::from_places(["reviewed"]));
        assert!(workflow.can(&subject, "publish").unwrap());

        workflow.apply(&mut subject, "publish").unwrap();
        assert_eq!(subject.marking, Some(json!("published")));
    }

    #[test]
    fn empty_marking_starts_at_initial_places() {
        let workflow = blog();
        let subject = article(None);

        assert_eq!(workflow.marking(&subject).unwrap(), Marking::from_places(["draft"]));
        assert!(workflow.can(&subject, "review").unwrap());
        assert_eq!(subject.marking, None);
    }

    #[test]
    fn initialize_persists_initial_marking() {
        let workflow = blog();
        let mut subject = article(None);

        let marking = workflow.initialize(&mut subject).unwrap();

        assert_eq!(marking, Marking::from_places(["draft"]));
        assert_eq!(subject.marking, Some(json!("draft")));

        let mut reviewed = article(Some(json!("reviewed")));
        workflow.initialize(&mut reviewed).unwrap();
        assert_eq!(reviewed.marking, Some(json!("reviewed")));
    }

    #[test]
    fn unknown_transition_is_reported() {
        let workflow = blog();
        let mut subject = article(None);

        assert!(matches!(
            workflow.can(&subject, "archive"),
            Err(WorkflowError::UnknownTransition { .. })
        ));
        assert!(matches!(
            workflow.apply(&mut subject, "archive"),
            Err(WorkflowError::UnknownTransition { .. })
        ));
    }

    #[test]
    fn stored_unknown_place_is_reported() {
        let workflow = blog();
        let subject = article(Some(json!("archived")));

        match workflow.marking(&subject) {
            Err(WorkflowError::UnknownPlace { workflow, place }) => {
                assert_eq!(workflow, "blog");
                assert_eq!(place, "archived");
            }
            other => panic!("expected UnknownPlace, got {other:?}"),
        }
    }

    #[test]
    fn not_enabled_leaves_marking_untouched() {
        let workflow = blog();
        let mut subject = article(Some(json!("draft")));

        let err = workflow.apply(&mut subject, "publish").unwrap_err();

        assert!(matches!(err, WorkflowError::NotEnabled { .. }));
        assert_eq!(subject.marking, Some(json!("draft")));
    }

    #[test]
    fn join_requires_every_from_place() {
        let definition = Arc::new(
            Definition::new(
                WorkflowType::Workflow,
                ["a", "b", "c"],
                vec![Transition::new("join", ["a", "b"], ["c"])],
                Vec::<String>::new(),
            )
            .unwrap(),
        );
        let workflow = Workflow::new("w", definition, Arc::new(MultipleStateStore::default()));

        let only_a = article(Some(json!({ "a": 1 })));
        assert!(!workflow.can(&only_a, "join").unwrap());

        let mut both = article(Some(json!({ "a": 1, "b": 1 })));
        assert!(workflow.can(&both, "join").unwrap());

        let marking = workflow.apply(&mut both, "join").unwrap();
        assert_eq!(marking, Marking::from_places(["c"]));
        assert_eq!(both.marking, Some(json!({ "c": 1 })));
    }

    #[test]
    fn fork_marks_every_to_place_and_keeps_other_tokens() {
        let definition = Arc::new(
            Definition::new(
                WorkflowType::Workflow,
                ["start", "left", "right", "side"],
                vec![Transition::new("fork", ["start"], ["left", "right"])],
                ["start", "side"],
            )
            .unwrap(),
        );
        let workflow = Workflow::new("w", definition, Arc::new(MultipleStateStore::default()));
        let mut subject = article(None);

        let marking = workflow.apply(&mut subject, "fork").unwrap();

        assert_eq!(marking, Marking::from_places(["left", "right", "side"]));
    }

    #[test]
    fn same_named_transitions_are_alternatives() {
        let definition = Arc::new(
            Definition::new(
                WorkflowType::StateMachine,
                ["a", "b", "c", "d"],
                vec![
                    Transition::new("next", ["a"], ["b"]),
                    Transition::new("next", ["c"], ["d"]),
                ],
                Vec::<String>::new(),
            )
            .unwrap(),
        );
        let workflow = Workflow::new("w", definition, Arc::new(SingleStateStore::default()));

        let mut at_c = article(Some(json!("c")));
        assert!(workflow.can(&at_c, "next").unwrap());
        workflow.apply(&mut at_c, "next").unwrap();
        assert_eq!(at_c.marking, Some(json!("d")));

        let at_b = article(Some(json!("b")));
        assert!(!workflow.can(&at_b, "next").unwrap());
    }

    #[test]
    fn workflow_guards_veto_candidates() {
        let mut guards = HashMap::new();
        guards.insert(
            "review".to_string(),
            vec![Guard::on_subject(|s| {
                s.as_any()
                    .downcast_ref::<Article>()
                    .is_some_and(|a| a.approved)
            })],
        );
        let workflow = Workflow::with_parts(
            "blog".to_string(),
            blog_definition(),
            Arc::new(SingleStateStore::default()),
            None,
            guards,
        );

        let approved = article(Some(json!("draft")));
        assert!(workflow.can(&approved, "review").unwrap());

        let mut rejected = Article {
            marking: Some(json!("draft")),
            approved: false,
        };
        assert!(!workflow.can(&rejected, "review").unwrap());
        assert!(matches!(
            workflow.apply(&mut rejected, "review"),
            Err(WorkflowError::NotEnabled { .. })
        ));
    }

    #[test]
    fn events_follow_the_lifecycle_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = recording_bus(&log);
        let definition = Arc::new(
            Definition::new(
                WorkflowType::Workflow,
                ["a", "b", "c", "d"],
                vec![Transition::new("t", ["a", "b"], ["c", "d"])],
                ["a", "b"],
            )
            .unwrap(),
        );
        let workflow = Workflow::with_parts(
            "w".to_string(),
            definition,
            Arc::new(MultipleStateStore::default()),
            Some(bus),
            HashMap::new(),
        );
        let mut subject = article(None);

        workflow.apply(&mut subject, "t").unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            [
                "guard:t", "leave:a", "leave:b", "transition:t", "enter:c", "enter:d",
                "entered:c", "entered:d",
            ]
        );
    }

    #[test]
    fn listeners_observe_the_working_marking() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for phase in [Phase::Leave, Phase::Transition, Phase::Enter, Phase::Entered] {
            let seen = Arc::clone(&seen);
            bus.on(
                crate::event::transition_event_name("blog", phase, "review"),
                move |event: &mut Event<'_>| {
                    let stored = event.subject().property("marking");
                    let working: Vec<_> = event.marking().places().map(str::to_string).collect();
                    seen.lock().unwrap().push((event.phase(), working, stored));
                    Ok(())
                },
            );
        }
        let workflow = Workflow::with_parts(
            "blog".to_string(),
            blog_definition(),
            Arc::new(SingleStateStore::default()),
            Some(bus),
            HashMap::new(),
        );
        let mut subject = article(Some(json!("draft")));

        workflow.apply(&mut subject, "review").unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, Phase::Leave);
        assert_eq!(seen[0].1, ["draft"]);
        assert_eq!(seen[1].0, Phase::Transition);
        assert!(seen[1].1.is_empty());
        assert_eq!(seen[2].0, Phase::Enter);
        assert_eq!(seen[2].1, ["reviewed"]);
        assert_eq!(seen[2].2, Some(json!("draft")));
        assert_eq!(seen[3].0, Phase::Entered);
        assert_eq!(seen[3].2, Some(json!("reviewed")));
    }

    #[test]
    fn guard_listener_blocks_and_can_stays_pure() {
        let bus = Arc::new(EventBus::new());
        bus.on("workflow.blog.guard.review", |event: &mut Event<'_>| {
            event.block();
            Ok(())
        });
        let workflow = Workflow::with_parts(
            "blog".to_string(),
            blog_definition(),
            Arc::new(SingleStateStore::default()),
            Some(bus),
            HashMap::new(),
        );
        let mut subject = article(Some(json!("draft")));

        assert!(!workflow.can(&subject, "review").unwrap());
        assert!(!workflow.can(&subject, "review").unwrap());
        assert!(matches!(
            workflow.apply(&mut subject, "review"),
            Err(WorkflowError::NotEnabled { .. })
        ));
        assert_eq!(subject.marking, Some(json!("draft")));
    }

    #[test]
    fn listener_failure_before_persistence_aborts_apply() {
        let bus = Arc::new(EventBus::new());
        bus.on("workflow.blog.enter", |_: &mut Event<'_>| {
            Err(ListenerError::failed("audit sink unavailable"))
        });
        let workflow = Workflow::with_parts(
            "blog".to_string(),
            blog_definition(),
            Arc::new(SingleStateStore::default()),
            Some(bus),
            HashMap::new(),
        );
        let mut subject = article(Some(json!("draft")));

        let err = workflow.apply(&mut subject, "review").unwrap_err();

        assert!(matches!(err, WorkflowError::Listener(ListenerError::Failed(_))));
        assert_eq!(subject.marking, Some(json!("draft")));
    }
}
