use super::Workflow;
use crate::core::{Marking, Transition};
use crate::error::Result;
use crate::subject::Subject;

/// Lazy iterator over the transitions enabled for one subject.
///
/// Walks the definition in order against the marking loaded when the
/// iterator was created. Guards run only as items are pulled.
pub struct EnabledTransitions<'a> {
    workflow: &'a Workflow,
    subject: &'a dyn Subject,
    marking: Marking,
    remaining: std::slice::Iter<'a, Transition>,
}

impl<'a> EnabledTransitions<'a> {
    pub(super) fn new(workflow: &'a Workflow, subject: &'a dyn Subject, marking: Marking) -> Self {
        Self {
            workflow,
            subject,
            marking,
            remaining: workflow.definition.transitions().iter(),
        }
    }

    /// Marking the iterator evaluates against.
    pub fn marking(&self) -> &Marking {
        &self.marking
    }
}

impl<'a> Iterator for EnabledTransitions<'a> {
    type Item = Result<&'a Transition>;

    fn next(&mut self) -> Option<Self::Item> {
        for transition in self.remaining.by_ref() {
            match self.workflow.is_enabled(self.subject, &self.marking, transition) {
                Ok(true) => return Some(Ok(transition)),
                Ok(false) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{Definition, Transition, WorkflowType};
    use crate::event::{Event, EventBus};
    use crate::impl_subject;
    use crate::store::MultipleStateStore;
    use crate::workflow::Workflow;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Order {
        marking: Option<Value>,
    }

    impl_subject!(Order as "Order" { marking });

    fn workflow(bus: Option<Arc<EventBus>>) -> Workflow {
        let definition = Definition::new(
            WorkflowType::Workflow,
            ["cart", "paid", "packed", "shipped"],
            vec![
                Transition::new("pay", ["cart"], ["paid"]),
                Transition::new("pack", ["paid"], ["packed"]),
                Transition::new("cancel", ["cart"], ["shipped"]),
                Transition::new("ship", ["packed"], ["shipped"]),
            ],
            ["cart"],
        )
        .unwrap();
        Workflow::with_parts(
            "orders".to_string(),
            Arc::new(definition),
            Arc::new(MultipleStateStore::default()),
            bus.map(|bus| bus as Arc<dyn crate::event::EventDispatcher>),
            HashMap::new(),
        )
    }

    #[test]
    fn yields_enabled_transitions_in_definition_order() {
        let workflow = workflow(None);
        let order = Order { marking: None };

        let names: Vec<_> = workflow
            .enabled_transitions(&order)
            .unwrap()
            .map(|t| t.unwrap().name().to_string())
            .collect();

        assert_eq!(names, ["pay", "cancel"]);
    }

    #[test]
    fn nothing_enabled_yields_nothing() {
        let workflow = workflow(None);
        let order = Order {
            marking: Some(json!({ "shipped": 1 })),
        };

        assert_eq!(workflow.enabled_transitions(&order).unwrap().count(), 0);
    }

    #[test]
    fn guards_run_lazily() {
        let bus = Arc::new(EventBus::new());
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&checks);
        bus.on("workflow.orders.guard", move |_: &mut Event<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let workflow = workflow(Some(bus));
        let order = Order { marking: None };

        let mut enabled = workflow.enabled_transitions(&order).unwrap();
        assert_eq!(checks.load(Ordering::SeqCst), 0);

        assert_eq!(enabled.next().unwrap().unwrap().name(), "pay");
        assert_eq!(checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocked_transitions_are_skipped() {
        let bus = Arc::new(EventBus::new());
        bus.on("workflow.orders.guard.pay", |event: &mut Event<'_>| {
            event.block();
            Ok(())
        });
        let workflow = workflow(Some(bus));
        let order = Order { marking: None };

        let names: Vec<_> = workflow
            .enabled_transitions(&order)
            .unwrap()
            .map(|t| t.unwrap().name().to_string())
            .collect();

        assert_eq!(names, ["cancel"]);
    }
}
