//! Marking store for state machines.

use super::{MarkingStore, DEFAULT_PROPERTY};
use crate::core::Marking;
use crate::error::{Result, WorkflowError};
use crate::subject::{PropertyAccessor, PropertyError, Subject, SubjectPropertyAccessor};
use serde_json::Value;
use std::sync::Arc;

/// Stores the marking as a single place name on a subject property.
///
/// Only valid for markings with at most one active place; persisting more
/// fails with [`WorkflowError::UnsupportedMarking`]. Place metadata is not
/// kept.
pub struct SingleStateStore {
    property: String,
    accessor: Arc<dyn PropertyAccessor>,
}

impl SingleStateStore {
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
}

impl Default for SingleStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_PROPERTY)
    }
}

impl MarkingStore for SingleStateStore {
    fn get_marking(&self, subject: &dyn Subject) -> Result<Marking> {
        match self.accessor.get_value(subject, &self.property)? {
            None | Some(Value::Null) => Ok(Marking::new()),
            Some(Value::String(place)) if place.is_empty() => Ok(Marking::new()),
            Some(Value::String(place)) => Ok(Marking::from_places([place])),
            Some(other) => Err(PropertyError::InvalidValue {
                property: self.property.clone(),
                reason: format!("expected a place name, got {other}"),
            }
            .into()),
        }
    }

    fn set_marking(&self, subject: &mut dyn Subject, marking: &Marking) -> Result<()> {
        let mut places = marking.places();
        let value = match (places.next(), places.next()) {
            (None, _) => Value::Null,
            (Some(place), None) => Value::String(place.to_string()),
            (Some(_), Some(_)) => {
                return Err(WorkflowError::UnsupportedMarking {
                    places: marking.places().map(str::to_string).collect(),
                })
            }
        };

        self.accessor.set_value(subject, &self.property, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_subject;
    use serde_json::json;

    struct Ticket {
        marking: Option<String>,
        status: Value,
    }

    impl_subject!(Ticket as "Ticket" { marking, status });

    fn ticket(marking: Option<&str>) -> Ticket {
        Ticket {
            marking: marking.map(str::to_string),
            status: Value::Null,
        }
    }

    #[test]
    fn reads_the_current_place() {
        let store = SingleStateStore::default();
        let marking = store.get_marking(&ticket(Some("open"))).unwrap();

        assert_eq!(marking, Marking::from_places(["open"]));
    }

    #[test]
    fn unset_or_empty_reads_as_empty_marking() {
        let store = SingleStateStore::default();
        assert!(store.get_marking(&ticket(None)).unwrap().is_empty());
        assert!(store.get_marking(&ticket(Some(""))).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_string_values() {
        let store = SingleStateStore::new("status");
        let mut t = ticket(None);
        t.status = json!(["open", "closed"]);

        assert!(matches!(
            store.get_marking(&t),
            Err(WorkflowError::Property(PropertyError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn writes_the_single_place() {
        let store = SingleStateStore::default();
        let mut t = ticket(Some("open"));

        store
            .set_marking(&mut t, &Marking::from_places(["closed"]))
            .unwrap();
        assert_eq!(t.marking.as_deref(), Some("closed"));

        store.set_marking(&mut t, &Marking::new()).unwrap();
        assert_eq!(t.marking, None);
    }

    #[test]
    fn refuses_multiple_places_and_writes_nothing() {
        let store = SingleStateStore::default();
        let mut t = ticket(Some("open"));

        let err = store
            .set_marking(&mut t, &Marking::from_places(["a", "b"]))
            .unwrap_err();

        match err {
            WorkflowError::UnsupportedMarking { places } => assert_eq!(places, ["a", "b"]),
            other => panic!("expected UnsupportedMarking, got {other:?}"),
        }
        assert_eq!(t.marking.as_deref(), Some("open"));
    }
}
