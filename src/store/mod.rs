//! Marking stores: where a subject's marking lives.
//!
//! A store reads and writes the marking of one subject. The two reference
//! stores keep it on a named subject property, through a
//! [`PropertyAccessor`](crate::subject::PropertyAccessor):
//!
//! - [`MultipleStateStore`]: an object of marked places, for workflows
//!   where several places may be active at once
//! - [`SingleStateStore`]: a single place name, for state machines
//!
//! Callers needing atomic read-modify-write across concurrent writers of
//! one subject must provide a transactional store of their own.

mod multiple;
mod single;

pub use multiple::MultipleStateStore;
pub use single::SingleStateStore;

use crate::core::Marking;
use crate::error::Result;
use crate::subject::Subject;

/// Property name used by the reference stores unless configured otherwise.
pub const DEFAULT_PROPERTY: &str = "marking";

/// Reads and persists the marking of a subject.
pub trait MarkingStore: Send + Sync {
    fn get_marking(&self, subject: &dyn Subject) -> Result<Marking>;

    fn set_marking(&self, subject: &mut dyn Subject, marking: &Marking) -> Result<()>;
}
