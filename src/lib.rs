//! Placemark: a workflow and state machine engine
//!
//! Placemark moves subjects through declarative definitions of places and
//! transitions. A subject's position is a *marking*, the set of places it
//! currently occupies, so a subject may sit in several places at once
//! (Petri-net workflows) or in exactly one (state machines).
//!
//! # Core Concepts
//!
//! - **Definition**: immutable, validated graph of places and transitions
//! - **Marking**: the active places of one subject, read and written by a
//!   pluggable `MarkingStore`
//! - **Workflow**: answers `can`, lists enabled transitions and `apply`s them
//! - **Guards**: predicates and guard listeners that veto transitions
//! - **Events**: synchronous lifecycle events on an `EventBus`
//! - **Registry**: finds the workflow governing a subject
//!
//! # Example
//!
//! ```rust
//! use placemark::builder::{DefinitionBuilder, WorkflowBuilder};
//! use placemark::impl_subject;
//!
//! struct Article {
//!     marking: Option<String>,
//! }
//!
//! impl_subject!(Article as "Article" { marking });
//!
//! let definition = DefinitionBuilder::state_machine()
//!     .places(["draft", "reviewed", "published"])
//!     .transition("review", ["draft"], ["reviewed"])
//!     .transition("publish", ["reviewed"], ["published"])
//!     .initial_place("draft")
//!     .build()
//!     .unwrap();
//! let workflow = WorkflowBuilder::new("blog", definition).build();
//!
//! let mut article = Article { marking: None };
//! assert!(workflow.can(&article, "review").unwrap());
//! assert!(!workflow.can(&article, "publish").unwrap());
//!
//! workflow.apply(&mut article, "review").unwrap();
//! assert_eq!(article.marking.as_deref(), Some("reviewed"));
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod event;
pub mod listeners;
pub mod registry;
pub mod store;
pub mod subject;
pub mod workflow;

// Re-export commonly used types
pub use core::{Definition, Guard, Marking, Transition, WorkflowType};
pub use error::{Result, WorkflowError};
pub use event::{Event, EventBus, EventDispatcher, Phase};
pub use registry::{Registry, SupportStrategy};
pub use store::{MarkingStore, MultipleStateStore, SingleStateStore};
pub use subject::Subject;
pub use workflow::Workflow;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
