//! Marking store for markings with several active places.

use super::{MarkingStore, DEFAULT_PROPERTY};
use crate::core::Marking;
use crate::error::Result;
use crate::subject::{PropertyAccessor, PropertyError, Subject, SubjectPropertyAccessor};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Stores the marking as a JSON object on a subject property.
///
/// Each key is a marked place. On read, `true`, a positive number or an
/// object (the place metadata) mark the place; `false`, `0` and `null` do
/// not. On write, a place without metadata is stored as `1`.
pub struct MultipleStateStore {
    property: String,
    accessor: Arc<dyn PropertyAccessor>,
}

impl MultipleStateStore {
    pub fn new(property: impl Into<String>) -> Self {
        Self::with_accessor(property, Arc::new(SubjectPropertyAccessor))
    }

    pub fn with_accessor(property: impl Into<String>, accessor: Arc<dyn PropertyAccessor>) -> Self {
        Self {
            property: property.into(),
            accessor,
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    fn invalid(&self, reason: String) -> PropertyError {
        PropertyError::InvalidValue {
            property: self.property.clone(),
            reason,
        }
    }
}

impl Default for MultipleStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_PROPERTY)
    }
}

impl MarkingStore for MultipleStateStore {
    fn get_marking(&self, subject: &dyn Subject) -> Result<Marking> {
        let mut marking = Marking::new();

        let places = match self.accessor.get_value(subject, &self.property)? {
            None | Some(Value::Null) => return Ok(marking),
            Some(Value::Object(places)) => places,
            Some(other) => {
                return Err(self
                    .invalid(format!("expected an object of marked places, got {other}"))
                    .into())
            }
        };

        for (place, value) in places {
            match value {
                Value::Bool(true) => marking.mark(place),
                Value::Bool(false) | Value::Null => {}
                Value::Number(n) => {
                    if n.as_f64().is_some_and(|tokens| tokens > 0.0) {
                        marking.mark(place);
                    }
                }
                Value::Object(metadata) => marking.mark_with(place, metadata),
                other => {
                    return Err(self
                        .invalid(format!("place '{place}' has unsupported value {other}"))
                        .into())
                }
            }
        }

        Ok(marking)
    }

    fn set_marking(&self, subject: &mut dyn Subject, marking: &Marking) -> Result<()> {
        let places: Map<String, Value> = marking
            .entries()
            .map(|(place, metadata)| {
                let value = if metadata.is_empty() {
                    Value::from(1)
                } else {
                    Value::Object(metadata.clone())
                };
                (place.to_string(), value)
            })
            .collect();

        self.accessor
            .set_value(subject, &self.property, Value::Object(places))?;
        Ok(())
    }
}
