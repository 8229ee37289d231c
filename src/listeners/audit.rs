//! Audit trail through `tracing`.

use crate::event::{workflow_event_name, Event, EventBus, Listener, ListenerError, Phase};
use std::sync::Arc;
use tracing::info;

/// Logs every place left and entered and every transition fired, at `info`
/// level under the `workflow` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditTrailListener;

impl AuditTrailListener {
    pub fn new() -> Self {
        Self
    }

    /// Subscribe to the `leave`, `transition` and `enter` events of `workflow`.
    pub fn subscribe(self, bus: &EventBus, workflow: &str) {
        let listener: Arc<dyn Listener> = Arc::new(self);
        for phase in [Phase::Leave, Phase::Transition, Phase::Enter] {
            bus.subscribe(workflow_event_name(workflow, phase), Arc::clone(&listener));
        }
    }
}

impl Listener for AuditTrailListener {
    fn handle(&self, event: &mut Event<'_>) -> Result<(), ListenerError> {
        let subject = event.subject().type_name();
        let workflow = event.workflow();

        match (event.phase(), event.place()) {
            (Phase::Leave, Some(place)) => {
                info!(target: "workflow", workflow, subject, "Leaving \"{place}\"");
            }
            (Phase::Transition, _) => {
                let name = event.transition().name();
                info!(target: "workflow", workflow, subject, "Transition \"{name}\"");
            }
            (Phase::Enter, Some(place)) => {
                info!(target: "workflow", workflow, subject, "Entering \"{place}\"");
            }
            _ => {}
        }
        Ok(())
    }
}
