//! Transition history tracking.
//!
//! Immutable record of the transitions applied to subjects, kept by the
//! history listener.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of one applied transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Workflow the transition belongs to
    pub workflow: String,
    /// Name of the transition that fired
    pub transition: String,
    /// Places consumed
    pub from: Vec<String>,
    /// Places produced
    pub to: Vec<String>,
    /// Subject type name, for display
    pub subject: String,
    /// When the transition fired
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of applied transitions.
///
/// `record` returns a new history and leaves the original untouched.
///
/// # Example
///
/// ```rust
/// use placemark::core::{TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let history = TransitionHistory::new();
/// let history = history.record(TransitionRecord {
///     workflow: "blog".to_string(),
///     transition: "review".to_string(),
///     from: vec!["draft".to_string()],
///     to: vec!["reviewed".to_string()],
///     subject: "Article".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.records().len(), 1);
/// assert_eq!(history.transition_names(), ["review"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: Vec<TransitionRecord>,
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    /// Names of the fired transitions, oldest first.
    pub fn transition_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.transition.as_str()).collect()
    }

    /// Records of one workflow only.
    pub fn for_workflow<'a>(&'a self, workflow: &'a str) -> impl Iterator<Item = &'a TransitionRecord> {
        self.records.iter().filter(move |r| r.workflow == workflow)
    }

    /// Time between the first and the last recorded transition.
    ///
    /// `None` when nothing has been recorded.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.first()?, self.records.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
