//! Stock listeners for the event bus.
//!
//! Each listener subscribes itself to the event names it needs; attach them
//! to a shared [`EventBus`](crate::event::EventBus) before applying
//! transitions.

mod audit;
mod guard;
mod history;

pub use audit::AuditTrailListener;
pub use guard::{GuardEvaluator, GuardListener};
pub use history::HistoryListener;
