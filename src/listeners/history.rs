//! Transition history recording.

use crate::core::{TransitionHistory, TransitionRecord};
use crate::event::{workflow_event_name, Event, EventBus, Listener, ListenerError, Phase};
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};

/// Records every fired transition of the workflows it is subscribed to.
#[derive(Debug, Default)]
pub struct HistoryListener {
    history: Mutex<TransitionHistory>,
}

impl HistoryListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the `transition` events of `workflow`.
    pub fn subscribe(self: Arc<Self>, bus: &EventBus, workflow: &str) {
        bus.subscribe(workflow_event_name(workflow, Phase::Transition), self);
    }

    /// Snapshot of everything recorded so far.
    pub fn history(&self) -> TransitionHistory {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Listener for HistoryListener {
    fn handle(&self, event: &mut Event<'_>) -> Result<(), ListenerError> {
        let transition = event.transition();
        let record = TransitionRecord {
            workflow: event.workflow().to_string(),
            transition: transition.name().to_string(),
            from: transition.from().to_vec(),
            to: transition.to().to_vec(),
            subject: event.subject().type_name().to_string(),
            timestamp: Utc::now(),
        };

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        *history = history.record(record);
        Ok(())
    }
}
