//! Lifecycle events emitted while a workflow checks and applies transitions.
//!
//! Every emission goes to two names, in order:
//!
//! - `workflow.<name>.<phase>`
//! - `workflow.<name>.<phase>.<transition>`
//!
//! Phases follow a fixed order for a successful apply: `guard`, then one
//! `leave` per consumed place, one `transition`, one `enter` per produced
//! place, the marking is persisted, then one `entered` per produced place.

mod dispatcher;

pub use dispatcher::{EventBus, EventDispatcher, Listener, ListenerError};

use crate::core::{Marking, Transition};
use crate::subject::Subject;
use std::fmt;

/// Stage of a transition's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Guard,
    Leave,
    Transition,
    Enter,
    Entered,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Guard,
        Phase::Leave,
        Phase::Transition,
        Phase::Enter,
        Phase::Entered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guard => "guard",
            Self::Leave => "leave",
            Self::Transition => "transition",
            Self::Enter => "enter",
            Self::Entered => "entered",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `workflow.<workflow>.<phase>`
pub fn workflow_event_name(workflow: &str, phase: Phase) -> String {
    format!("workflow.{workflow}.{phase}")
}

/// `workflow.<workflow>.<phase>.<transition>`
pub fn transition_event_name(workflow: &str, phase: Phase, transition: &str) -> String {
    format!("workflow.{workflow}.{phase}.{transition}")
}

/// Payload handed to listeners.
///
/// The marking is the working marking at the instant of dispatch: during
/// `leave`, `transition` and `enter` it is not yet persisted.
pub struct Event<'a> {
    workflow: &'a str,
    phase: Phase,
    subject: &'a dyn Subject,
    marking: &'a Marking,
    transition: &'a Transition,
    place: Option<&'a str>,
    blocked: bool,
}

impl<'a> Event<'a> {
    pub fn new(
        workflow: &'a str,
        phase: Phase,
        subject: &'a dyn Subject,
        marking: &'a Marking,
        transition: &'a Transition,
    ) -> Self {
        Self {
            workflow,
            phase,
            subject,
            marking,
            transition,
            place: None,
            blocked: false,
        }
    }

    /// Attach the place being left or entered.
    pub fn at_place(mut self, place: &'a str) -> Self {
        self.place = Some(place);
        self
    }

    pub fn workflow(&self) -> &'a str {
        self.workflow
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn subject(&self) -> &'a dyn Subject {
        self.subject
    }

    pub fn marking(&self) -> &'a Marking {
        self.marking
    }

    pub fn transition(&self) -> &'a Transition {
        self.transition
    }

    /// Place left or entered; `None` for `guard` and `transition`.
    pub fn place(&self) -> Option<&'a str> {
        self.place
    }

    /// Veto the transition. Only meaningful during the `guard` phase.
    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn workflow_event_name(&self) -> String {
        workflow_event_name(self.workflow, self.phase)
    }

    pub fn transition_event_name(&self) -> String {
        transition_event_name(self.workflow, self.phase, self.transition.name())
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("workflow", &self.workflow)
            .field("phase", &self.phase)
            .field("subject", &self.subject.type_name())
            .field("marking", &self.marking)
            .field("transition", &self.transition.name())
            .field("place", &self.place)
            .field("blocked", &self.blocked)
            .finish()
    }
}
