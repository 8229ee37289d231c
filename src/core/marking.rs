//! Markings: the set of places currently active for one subject.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Arbitrary per-place annotations carried alongside a marked place.
pub type PlaceMetadata = Map<String, Value>;

/// Set of marked places, each with optional metadata.
///
/// A marking does not know its definition. The workflow checks that every
/// marked place exists before using a marking.
///
/// # Example
///
/// ```rust
/// use placemark::core::Marking;
///
/// let mut marking = Marking::from_places(["a", "b"]);
/// assert!(marking.has("a"));
///
/// marking.unmark("a");
/// marking.mark("c");
/// assert_eq!(marking.places().collect::<Vec<_>>(), ["b", "c"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marking {
    places: BTreeMap<String, PlaceMetadata>,
}

impl Marking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_places<P: Into<String>>(places: impl IntoIterator<Item = P>) -> Self {
        let mut marking = Self::new();
        for place in places {
            marking.mark(place);
        }
        marking
    }

    pub fn has(&self, place: &str) -> bool {
        self.places.contains_key(place)
    }

    /// Mark a place. Metadata of an already marked place is kept.
    pub fn mark(&mut self, place: impl Into<String>) {
        self.places.entry(place.into()).or_default();
    }

    /// Mark a place with metadata, replacing any previous metadata.
    pub fn mark_with(&mut self, place: impl Into<String>, metadata: PlaceMetadata) {
        self.places.insert(place.into(), metadata);
    }

    /// Unmark a place, returning whether it was marked.
    pub fn unmark(&mut self, place: &str) -> bool {
        self.places.remove(place).is_some()
    }

    /// Names of the marked places, in name order.
    pub fn places(&self) -> impl Iterator<Item = &str> {
        self.places.keys().map(String::as_str)
    }

    /// Marked places with their metadata.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PlaceMetadata)> {
        self.places.iter().map(|(place, meta)| (place.as_str(), meta))
    }

    pub fn metadata(&self, place: &str) -> Option<&PlaceMetadata> {
        self.places.get(place)
    }

    /// Set one metadata key on a marked place.
    ///
    /// Returns `false` and changes nothing when the place is not marked.
    pub fn set_metadata(&mut self, place: &str, key: impl Into<String>, value: Value) -> bool {
        match self.places.get_mut(place) {
            Some(meta) => {
                meta.insert(key.into(), value);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}
