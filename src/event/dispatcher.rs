//! Synchronous, ordered event dispatch.

use super::Event;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Failure raised by a listener. Aborts the workflow call that dispatched it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListenerError {
    #[error("guard expression '{expression}' failed: {reason}")]
    GuardEvaluation { expression: String, reason: String },

    #[error("listener failed: {0}")]
    Failed(String),
}

impl ListenerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Consumer of workflow events.
pub trait Listener: Send + Sync {
    fn handle(&self, event: &mut Event<'_>) -> Result<(), ListenerError>;
}

impl<F> Listener for F
where
    F: Fn(&mut Event<'_>) -> Result<(), ListenerError> + Send + Sync,
{
    fn handle(&self, event: &mut Event<'_>) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Publishes events to the listeners subscribed under a name.
pub trait EventDispatcher: Send + Sync {
    /// Deliver `event` to every listener of `name`, synchronously and in
    /// subscription order. The first listener error stops delivery.
    fn dispatch(&self, name: &str, event: &mut Event<'_>) -> Result<(), ListenerError>;
}

/// In-process event bus.
///
/// Listeners may be added at any time through a shared reference.
///
/// # Example
///
/// ```rust
/// use placemark::event::{Event, EventBus};
///
/// let bus = EventBus::new();
/// bus.on("workflow.blog.guard.publish", |event: &mut Event<'_>| {
///     event.block();
///     Ok(())
/// });
///
/// assert_eq!(bus.listener_count("workflow.blog.guard.publish"), 1);
/// ```
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Arc<dyn Listener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener object under `name`.
    pub fn subscribe(&self, name: impl Into<String>, listener: Arc<dyn Listener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.into())
            .or_default()
            .push(listener);
    }

    /// Subscribe a closure under `name`.
    pub fn on<F>(&self, name: impl Into<String>, listener: F)
    where
        F: Fn(&mut Event<'_>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.subscribe(name, Arc::new(listener));
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, name: &str) -> bool {
        self.listener_count(name) > 0
    }
}

impl EventDispatcher for EventBus {
    fn dispatch(&self, name: &str, event: &mut Event<'_>) -> Result<(), ListenerError> {
        // Snapshot so listeners may subscribe while being called.
        let listeners = match self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            Some(listeners) => listeners.clone(),
            None => return Ok(()),
        };

        for listener in listeners {
            listener.handle(event)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = listeners.keys().collect();
        names.sort();
        f.debug_struct("EventBus").field("events", &names).finish()
    }
}
