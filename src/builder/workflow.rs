//! Builder for constructing workflows.

use crate::core::{Definition, Guard, GuardContext, SecurityContext, WorkflowType};
use crate::event::EventDispatcher;
use crate::store::{MarkingStore, MultipleStateStore, SingleStateStore};
use crate::workflow::Workflow;
use std::collections::HashMap;
use std::sync::Arc;

/// Builder binding a definition to its store, dispatcher and guards.
///
/// Without an explicit store, state machines get a [`SingleStateStore`] and
/// workflows a [`MultipleStateStore`], both on the `marking` property.
///
/// # Example
///
/// ```
/// use placemark::builder::{DefinitionBuilder, WorkflowBuilder};
/// use placemark::impl_subject;
///
/// struct Task {
///     marking: Option<String>,
///     assignee: Option<String>,
/// }
///
/// impl_subject!(Task as "Task" { marking });
///
/// let definition = DefinitionBuilder::state_machine()
///     .places(["todo", "doing"])
///     .transition("start", ["todo"], ["doing"])
///     .initial_place("todo")
///     .build()
///     .unwrap();
///
/// let workflow = WorkflowBuilder::new("tasks", definition)
///     .when_subject::<Task, _>("start", |task| task.assignee.is_some())
///     .build();
///
/// let mut task = Task { marking: None, assignee: None };
/// assert!(!workflow.can(&task, "start").unwrap());
///
/// task.assignee = Some("ada".to_string());
/// workflow.apply(&mut task, "start").unwrap();
/// assert_eq!(task.marking.as_deref(), Some("doing"));
/// ```
pub struct WorkflowBuilder {
    name: String,
    definition: Arc<Definition>,
    store: Option<Arc<dyn MarkingStore>>,
    dispatcher: Option<Arc<dyn EventDispatcher>>,
    guards: HashMap<String, Vec<Guard>>,
    security: Option<Arc<dyn SecurityContext>>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>, definition: impl Into<Arc<Definition>>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            store: None,
            dispatcher: None,
            guards: HashMap::new(),
            security: None,
        }
    }

    pub fn marking_store(mut self, store: Arc<dyn MarkingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Security context handed to this workflow's guards.
    pub fn security_context(mut self, security: Arc<dyn SecurityContext>) -> Self {
        self.security = Some(security);
        self
    }

    /// Add a guard on every transition called `transition`. Guards run in
    /// the order they are added.
    pub fn guard(mut self, transition: impl Into<String>, guard: Guard) -> Self {
        self.guards.entry(transition.into()).or_default().push(guard);
        self
    }

    /// Add a guard using a closure.
    pub fn when<F>(self, transition: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&GuardContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.guard(transition, Guard::new(predicate))
    }

    /// Add a guard on the concrete subject type. Other subject types are
    /// denied.
    pub fn when_subject<S, F>(self, transition: impl Into<String>, predicate: F) -> Self
    where
        S: 'static,
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.guard(
            transition,
            Guard::on_subject(move |subject| {
                subject.as_any().downcast_ref::<S>().is_some_and(&predicate)
            }),
        )
    }

    pub fn build(self) -> Workflow {
        let store: Arc<dyn MarkingStore> = match self.store {
            Some(store) => store,
            None => match self.definition.workflow_type() {
                WorkflowType::StateMachine => Arc::new(SingleStateStore::default()),
                WorkflowType::Workflow => Arc::new(MultipleStateStore::default()),
            },
        };

        Workflow::with_parts(self.name, self.definition, store, self.dispatcher, self.guards)
            .with_security(self.security)
    }
}
