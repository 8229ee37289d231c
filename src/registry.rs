//! Subject-to-workflow lookup.
//!
//! The registry answers "which workflow governs this subject?". Entries are
//! kept in registration order; lookups never mutate the registry.

use crate::error::{Result, WorkflowError};
use crate::subject::Subject;
use crate::workflow::Workflow;
use std::sync::Arc;
use tracing::debug;

/// Decides whether a registered workflow supports a subject.
#[derive(Clone)]
pub enum SupportStrategy {
    /// Supported when the subject's type name, or any name it implements,
    /// is listed.
    ClassList(Vec<String>),
    /// Supported when the predicate returns `true`.
    Predicate(Arc<dyn Fn(&dyn Subject) -> bool + Send + Sync>),
}

impl SupportStrategy {
    pub fn class_list<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::ClassList(names.into_iter().map(Into::into).collect())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&dyn Subject) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    pub fn supports(&self, subject: &dyn Subject) -> bool {
        match self {
            Self::ClassList(names) => names.iter().any(|name| subject.is_a(name)),
            Self::Predicate(predicate) => predicate(subject),
        }
    }
}

impl std::fmt::Debug for SupportStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassList(names) => f.debug_tuple("ClassList").field(names).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Workflows paired with the strategy that selects their subjects.
///
/// # Example
///
/// ```rust
/// use placemark::core::{Definition, Transition, WorkflowType};
/// use placemark::impl_subject;
/// use placemark::registry::{Registry, SupportStrategy};
/// use placemark::store::SingleStateStore;
/// use placemark::workflow::Workflow;
/// use std::sync::Arc;
///
/// struct Invoice {
///     marking: Option<String>,
/// }
///
/// impl_subject!(Invoice as "Invoice" { marking });
///
/// let definition = Definition::new(
///     WorkflowType::StateMachine,
///     ["open", "paid"],
///     vec![Transition::new("pay", ["open"], ["paid"])],
///     ["open"],
/// )
/// .unwrap();
/// let workflow = Workflow::new("invoice", Arc::new(definition), Arc::new(SingleStateStore::default()));
///
/// let mut registry = Registry::new();
/// registry.add(Arc::new(workflow), SupportStrategy::class_list(["Invoice"]));
///
/// let invoice = Invoice { marking: None };
/// assert_eq!(registry.get(&invoice, None).unwrap().name(), "invoice");
/// ```
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: Vec<(Arc<Workflow>, SupportStrategy)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow. The same workflow may be added under several
    /// strategies.
    pub fn add(&mut self, workflow: Arc<Workflow>, strategy: SupportStrategy) {
        debug!(workflow = workflow.name(), strategy = ?strategy, "registered workflow");
        self.entries.push((workflow, strategy));
    }

    /// Every workflow supporting `subject`, in registration order, each once.
    pub fn all(&self, subject: &dyn Subject) -> Vec<Arc<Workflow>> {
        let mut matches: Vec<Arc<Workflow>> = Vec::new();
        for (workflow, strategy) in &self.entries {
            if strategy.supports(subject) && !matches.iter().any(|m| Arc::ptr_eq(m, workflow)) {
                matches.push(Arc::clone(workflow));
            }
        }
        matches
    }

    /// The single workflow supporting `subject`, optionally restricted to
    /// workflows called `name`.
    pub fn get(&self, subject: &dyn Subject, name: Option<&str>) -> Result<Arc<Workflow>> {
        let mut matches = self.all(subject);
        if let Some(name) = name {
            matches.retain(|workflow| workflow.name() == name);
        }

        match matches.len() {
            0 => Err(WorkflowError::NoMatch {
                subject: subject.type_name().to_string(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(WorkflowError::AmbiguousMatch {
                subject: subject.type_name().to_string(),
                candidates: matches.iter().map(|w| w.name().to_string()).collect(),
            }),
        }
    }

    /// Whether exactly one workflow matches.
    pub fn has(&self, subject: &dyn Subject, name: Option<&str>) -> bool {
        self.get(subject, name).is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Definition, Transition, WorkflowType};
    use crate::impl_subject;
    use crate::store::SingleStateStore;

    struct TypeX {
        tag: String,
    }

    impl_subject!(TypeX as "TypeX" implements ["Taggable"] { tag });

    struct TypeY;

    impl_subject!(TypeY as "TypeY");

    fn workflow(name: &str) -> Arc<Workflow> {
        let definition = Definition::new(
            WorkflowType::StateMachine,
            ["a", "b"],
            vec![Transition::new("go", ["a"], ["b"])],
            ["a"],
        )
        .unwrap();
        Arc::new(Workflow::new(
            name,
            Arc::new(definition),
            Arc::new(SingleStateStore::default()),
        ))
    }

    fn special_tag() -> SupportStrategy {
        SupportStrategy::predicate(|s| {
            s.as_any()
                .downcast_ref::<TypeX>()
                .is_some_and(|x| x.tag == "special")
        })
    }

    fn ambiguous_registry() -> Registry {
        let mut registry = Registry::new();
        registry.add(workflow("w1"), SupportStrategy::class_list(["TypeX"]));
        registry.add(workflow("w2"), special_tag());
        registry
    }

    #[test]
    fn class_list_matches_type_and_implemented_names() {
        let strategy = SupportStrategy::class_list(["Taggable"]);
        assert!(strategy.supports(&TypeX { tag: String::new() }));
        assert!(!strategy.supports(&TypeY));
    }

    #[test]
    fn single_match_is_returned() {
        let registry = ambiguous_registry();
        let plain = TypeX {
            tag: "plain".to_string(),
        };

        assert_eq!(registry.get(&plain, None).unwrap().name(), "w1");
        assert!(registry.has(&plain, None));
    }

    #[test]
    fn several_matches_are_ambiguous() {
        let registry = ambiguous_registry();
        let special = TypeX {
            tag: "special".to_string(),
        };

        assert_eq!(registry.all(&special).len(), 2);
        match registry.get(&special, None) {
            Err(WorkflowError::AmbiguousMatch { subject, candidates }) => {
                assert_eq!(subject, "TypeX");
                assert_eq!(candidates, ["w1", "w2"]);
            }
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }
        assert!(!registry.has(&special, None));
    }

    #[test]
    fn name_filter_resolves_ambiguity() {
        let registry = ambiguous_registry();
        let special = TypeX {
            tag: "special".to_string(),
        };

        assert_eq!(registry.get(&special, Some("w2")).unwrap().name(), "w2");
    }

    #[test]
    fn unsupported_subject_has_no_match() {
        let registry = ambiguous_registry();

        assert!(matches!(
            registry.get(&TypeY, None),
            Err(WorkflowError::NoMatch { .. })
        ));
        assert!(matches!(
            registry.get(&TypeX { tag: String::new() }, Some("w3")),
            Err(WorkflowError::NoMatch { .. })
        ));
        assert!(registry.all(&TypeY).is_empty());
    }

    #[test]
    fn all_keeps_registration_order_without_duplicates() {
        let shared = workflow("shared");
        let mut registry = Registry::new();
        registry.add(Arc::clone(&shared), SupportStrategy::class_list(["TypeX"]));
        registry.add(workflow("other"), SupportStrategy::class_list(["Taggable"]));
        registry.add(Arc::clone(&shared), special_tag());

        let special = TypeX {
            tag: "special".to_string(),
        };
        let names: Vec<_> = registry
            .all(&special)
            .iter()
            .map(|w| w.name().to_string())
            .collect();

        assert_eq!(names, ["shared", "other"]);
        assert_eq!(registry.len(), 3);
    }
}
