//! Turns a configuration document into live workflows.

use super::{ConfigError, MarkingStoreType, WorkflowConfig, WorkflowEntry};
use crate::builder::{DefinitionBuilder, WorkflowBuilder};
use crate::core::{SecurityContext, Transition};
use crate::event::{transition_event_name, EventBus, Phase};
use crate::listeners::{AuditTrailListener, GuardEvaluator, GuardListener};
use crate::registry::{Registry, SupportStrategy};
use crate::store::{MarkingStore, MultipleStateStore, SingleStateStore, DEFAULT_PROPERTY};
use crate::subject::{PropertyAccessor, Subject, SubjectPropertyAccessor};
use crate::workflow::Workflow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Predicate registered under a name for `support_strategy`.
pub type SupportPredicate = Arc<dyn Fn(&dyn Subject) -> bool + Send + Sync>;

/// Optional features available to the factory, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Wire a [`GuardListener`] for transitions that carry a guard
    /// expression. When off, guard expressions are ignored.
    pub guard_listener: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            guard_listener: true,
        }
    }
}

/// Named collaborators that configuration entries refer to.
#[derive(Clone, Default)]
pub struct Services {
    marking_stores: HashMap<String, Arc<dyn MarkingStore>>,
    support_strategies: HashMap<String, SupportPredicate>,
    property_accessor: Option<Arc<dyn PropertyAccessor>>,
    guard_evaluator: Option<Arc<dyn GuardEvaluator>>,
    security: Option<Arc<dyn SecurityContext>>,
    capabilities: Capabilities,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marking_store(mut self, name: impl Into<String>, store: Arc<dyn MarkingStore>) -> Self {
        self.marking_stores.insert(name.into(), store);
        self
    }

    pub fn with_support_strategy<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&dyn Subject) -> bool + Send + Sync + 'static,
    {
        self.support_strategies.insert(name.into(), Arc::new(predicate));
        self
    }

    /// Accessor used by stores created from a `type`.
    pub fn with_property_accessor(mut self, accessor: Arc<dyn PropertyAccessor>) -> Self {
        self.property_accessor = Some(accessor);
        self
    }

    pub fn with_guard_evaluator(mut self, evaluator: Arc<dyn GuardEvaluator>) -> Self {
        self.guard_evaluator = Some(evaluator);
        self
    }

    pub fn with_security_context(mut self, security: Arc<dyn SecurityContext>) -> Self {
        self.security = Some(security);
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stores: Vec<_> = self.marking_stores.keys().collect();
        stores.sort();
        let mut strategies: Vec<_> = self.support_strategies.keys().collect();
        strategies.sort();
        f.debug_struct("Services")
            .field("marking_stores", &stores)
            .field("support_strategies", &strategies)
            .field("guard_evaluator", &self.guard_evaluator.is_some())
            .field("security", &self.security.is_some())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Everything built from one configuration document.
#[derive(Debug)]
pub struct Workflows {
    bus: Arc<EventBus>,
    registry: Registry,
    workflows: BTreeMap<String, Arc<Workflow>>,
}

impl Workflows {
    pub fn get(&self, name: &str) -> Option<&Arc<Workflow>> {
        self.workflows.get(name)
    }

    /// Workflow names, in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Bus shared by every workflow; subscribe additional listeners here.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

/// Builds [`Workflows`] from a [`WorkflowConfig`] and [`Services`].
#[derive(Debug, Default)]
pub struct WorkflowFactory {
    services: Services,
}

impl WorkflowFactory {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Validate `config` and wire every workflow it declares.
    ///
    /// Workflows are built and registered in name order.
    pub fn build(&self, config: &WorkflowConfig) -> Result<Workflows, ConfigError> {
        config.validate()?;

        let bus = Arc::new(EventBus::new());
        let mut registry = Registry::new();
        let mut workflows = BTreeMap::new();

        for (name, entry) in &config.workflows {
            let workflow = Arc::new(self.build_workflow(name, entry, &bus)?);

            registry.add(Arc::clone(&workflow), self.support_strategy(name, entry)?);

            if entry.audit_trail.enabled {
                AuditTrailListener::new().subscribe(&bus, name);
            }
            self.attach_guards(name, workflow.definition().transitions(), &bus)?;

            debug!(
                workflow = %name,
                workflow_type = entry.workflow_type.as_str(),
                transitions = workflow.definition().transitions().len(),
                "built workflow"
            );
            workflows.insert(name.clone(), workflow);
        }

        Ok(Workflows {
            bus,
            registry,
            workflows,
        })
    }

    fn build_workflow(
        &self,
        name: &str,
        entry: &WorkflowEntry,
        bus: &Arc<EventBus>,
    ) -> Result<Workflow, ConfigError> {
        let mut builder = DefinitionBuilder::new()
            .workflow_type(entry.workflow_type)
            .places(entry.places.iter().cloned())
            .initial_places(entry.initial_places());

        for transition in &entry.transitions {
            let mut t = Transition::new(&transition.name, &transition.from, &transition.to);
            if let Some(guard) = &transition.guard {
                t = t.with_guard(guard.as_str());
            }
            builder = builder.add_transition(t);
        }

        let definition = builder.build().map_err(|source| ConfigError::Workflow {
            workflow: name.to_string(),
            source,
        })?;

        let mut workflow = WorkflowBuilder::new(name, definition).dispatcher(bus.clone());
        if let Some(store) = self.marking_store(name, entry)? {
            workflow = workflow.marking_store(store);
        }
        if let Some(security) = &self.services.security {
            workflow = workflow.security_context(Arc::clone(security));
        }
        Ok(workflow.build())
    }

    /// `None` leaves the choice to the workflow type.
    fn marking_store(
        &self,
        name: &str,
        entry: &WorkflowEntry,
    ) -> Result<Option<Arc<dyn MarkingStore>>, ConfigError> {
        let config = &entry.marking_store;

        if let Some(service) = &config.service {
            return self
                .services
                .marking_stores
                .get(service)
                .cloned()
                .map(Some)
                .ok_or_else(|| ConfigError::UnknownService {
                    workflow: name.to_string(),
                    kind: "marking store",
                    service: service.clone(),
                });
        }

        let Some(store_type) = config.store_type else {
            return Ok(None);
        };
        if config.arguments.len() > 1 {
            warn!(workflow = %name, arguments = ?config.arguments, "extra marking store arguments ignored");
        }

        let property = config
            .arguments
            .first()
            .map_or(DEFAULT_PROPERTY, String::as_str);
        let accessor = self
            .services
            .property_accessor
            .clone()
            .unwrap_or_else(|| Arc::new(SubjectPropertyAccessor));

        let store: Arc<dyn MarkingStore> = match store_type {
            MarkingStoreType::MultipleState => Arc::new(MultipleStateStore::with_accessor(property, accessor)),
            MarkingStoreType::SingleState => Arc::new(SingleStateStore::with_accessor(property, accessor)),
        };
        Ok(Some(store))
    }

    fn support_strategy(&self, name: &str, entry: &WorkflowEntry) -> Result<SupportStrategy, ConfigError> {
        match &entry.support_strategy {
            Some(service) => self
                .services
                .support_strategies
                .get(service)
                .cloned()
                .map(SupportStrategy::Predicate)
                .ok_or_else(|| ConfigError::UnknownService {
                    workflow: name.to_string(),
                    kind: "support strategy",
                    service: service.clone(),
                }),
            None => Ok(SupportStrategy::ClassList(entry.supports.clone())),
        }
    }

    fn attach_guards(&self, name: &str, transitions: &[Transition], bus: &EventBus) -> Result<(), ConfigError> {
        if !transitions.iter().any(|t| t.guard().is_some()) {
            return Ok(());
        }
        if !self.services.capabilities.guard_listener {
            debug!(workflow = %name, "guard listener disabled, guard expressions ignored");
            return Ok(());
        }

        let evaluator = self
            .services
            .guard_evaluator
            .clone()
            .ok_or_else(|| ConfigError::GuardsUnavailable {
                workflow: name.to_string(),
            })?;

        let mut listener = GuardListener::new(evaluator);
        if let Some(security) = &self.services.security {
            listener = listener.with_security(Arc::clone(security));
        }
        for transition in transitions.iter().filter(|t| t.guard().is_some()) {
            listener = listener
                .with_transition_guards(transition_event_name(name, Phase::Guard, transition.name()));
        }

        Arc::new(listener).subscribe(bus);
        Ok(())
    }
}
