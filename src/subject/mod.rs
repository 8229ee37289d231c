//! Subjects: the external objects whose marking the engine tracks.
//!
//! The engine never owns a subject. It needs a type name for registry
//! lookups, downcasting for predicates and guards, and named property
//! access for the marking stores. Property access goes through the
//! [`PropertyAccessor`] capability so hosts can swap the mechanism.

use serde_json::Value;
use std::any::Any;
use thiserror::Error;

pub mod macros;

/// Errors raised while reading or writing a subject property.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PropertyError {
    #[error("subject of type '{type_name}' has no property '{property}'")]
    NoSuchProperty { type_name: String, property: String },

    #[error("property '{property}' is read-only on subject of type '{type_name}'")]
    ReadOnly { type_name: String, property: String },

    #[error("invalid value for property '{property}': {reason}")]
    InvalidValue { property: String, reason: String },
}

/// Downcasting support for subjects.
///
/// Implemented for every `'static` type; never implement it by hand.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An object tracked by a workflow.
///
/// Use [`impl_subject!`](crate::impl_subject) for plain structs.
pub trait Subject: AsAny + Send + Sync {
    /// Type name used by class-list support strategies.
    fn type_name(&self) -> &str;

    /// Further names this subject answers to (interfaces, roles).
    fn implements(&self) -> &[&str] {
        &[]
    }

    /// Whether the subject answers to `name`.
    fn is_a(&self, name: &str) -> bool {
        self.type_name() == name || self.implements().contains(&name)
    }

    /// Read a named property. `None` means unset or unknown.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Write a named property.
    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), PropertyError> {
        Err(PropertyError::NoSuchProperty {
            type_name: self.type_name().to_string(),
            property: name.to_string(),
        })
    }
}

/// Capability to read and write arbitrary named properties on subjects.
pub trait PropertyAccessor: Send + Sync {
    fn get_value(&self, subject: &dyn Subject, property: &str) -> Result<Option<Value>, PropertyError>;

    fn set_value(
        &self,
        subject: &mut dyn Subject,
        property: &str,
        value: Value,
    ) -> Result<(), PropertyError>;
}

/// Accessor delegating to [`Subject::property`] and [`Subject::set_property`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectPropertyAccessor;

impl PropertyAccessor for SubjectPropertyAccessor {
    fn get_value(&self, subject: &dyn Subject, property: &str) -> Result<Option<Value>, PropertyError> {
        Ok(subject.property(property))
    }

    fn set_value(
        &self,
        subject: &mut dyn Subject,
        property: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        subject.set_property(property, value)
    }
}
