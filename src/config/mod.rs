//! Declarative workflow configuration.
//!
//! A JSON document describes any number of workflows; [`WorkflowFactory`]
//! turns a validated [`WorkflowConfig`] into live workflows sharing one
//! event bus and one registry.
//!
//! ```json
//! {
//!   "workflows": {
//!     "blog": {
//!       "type": "state_machine",
//!       "marking_store": { "type": "single_state", "arguments": "status" },
//!       "supports": "Article",
//!       "places": ["draft", "reviewed", "published"],
//!       "initial_place": "draft",
//!       "transitions": {
//!         "review": { "from": "draft", "to": "reviewed" },
//!         "publish": { "from": "reviewed", "to": "published", "guard": "is_granted('ROLE_EDITOR')" }
//!       },
//!       "audit_trail": { "enabled": true }
//!     }
//!   }
//! }
//! ```

mod factory;
mod validate;

pub use factory::{Capabilities, Services, SupportPredicate, WorkflowFactory, Workflows};
pub use validate::ConfigViolation;

use crate::core::WorkflowType;
use crate::error::WorkflowError;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading, validating or wiring a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read workflow configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed workflow configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid workflow configuration: {}", join(.violations))]
    Invalid { violations: Vec<ConfigViolation> },

    #[error("workflow '{workflow}' references unknown {kind} service '{service}'")]
    UnknownService {
        workflow: String,
        kind: &'static str,
        service: String,
    },

    #[error("workflow '{workflow}' has guarded transitions but no guard evaluator is configured")]
    GuardsUnavailable { workflow: String },

    #[error("workflow '{workflow}': {source}")]
    Workflow {
        workflow: String,
        #[source]
        source: WorkflowError,
    },
}

fn join(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Root of a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub workflows: BTreeMap<String, WorkflowEntry>,
}

impl WorkflowConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// One workflow of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowEntry {
    #[serde(rename = "type", default)]
    pub workflow_type: WorkflowType,

    #[serde(default)]
    pub marking_store: MarkingStoreConfig,

    /// Subject type names this workflow governs.
    #[serde(default, deserialize_with = "one_or_many")]
    pub supports: Vec<String>,

    /// Name of a support predicate registered in [`Services`].
    #[serde(default)]
    pub support_strategy: Option<String>,

    #[serde(default)]
    pub places: Vec<String>,

    #[serde(default)]
    pub initial_place: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub initial_places: Vec<String>,

    /// A list of named transitions, or an object keyed by transition name.
    #[serde(default, deserialize_with = "transitions")]
    pub transitions: Vec<TransitionConfig>,

    #[serde(default)]
    pub audit_trail: AuditTrailConfig,
}

impl WorkflowEntry {
    /// `initial_place` and `initial_places` merged.
    pub fn initial_places(&self) -> Vec<String> {
        self.initial_place
            .iter()
            .chain(&self.initial_places)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkingStoreConfig {
    #[serde(rename = "type", default)]
    pub store_type: Option<MarkingStoreType>,

    /// Constructor arguments; the first is the subject property.
    #[serde(default, deserialize_with = "one_or_many")]
    pub arguments: Vec<String>,

    /// Name of a marking store registered in [`Services`].
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkingStoreType {
    #[serde(alias = "property_accessor")]
    MultipleState,
    #[serde(alias = "scalar")]
    SingleState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionConfig {
    pub name: String,

    #[serde(default, deserialize_with = "one_or_many")]
    pub from: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub to: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditTrailConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Accept `"x"` as shorthand for `["x"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Transition body when transitions are keyed by name.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TransitionBody {
    #[serde(default, deserialize_with = "one_or_many")]
    from: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    to: Vec<String>,
    #[serde(default)]
    guard: Option<String>,
}

/// Accept a list of transitions or an object keyed by name, keeping
/// document order either way.
fn transitions<'de, D>(deserializer: D) -> Result<Vec<TransitionConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TransitionsVisitor;

    impl<'de> Visitor<'de> for TransitionsVisitor {
        type Value = Vec<TransitionConfig>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of transitions or an object keyed by transition name")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut transitions = Vec::new();
            while let Some(transition) = seq.next_element()? {
                transitions.push(transition);
            }
            Ok(transitions)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut transitions = Vec::new();
            while let Some((name, body)) = map.next_entry::<String, TransitionBody>()? {
                if name.is_empty() {
                    return Err(de::Error::custom("transition names must not be empty"));
                }
                transitions.push(TransitionConfig {
                    name,
                    from: body.from,
                    to: body.to,
                    guard: body.guard,
                });
            }
            Ok(transitions)
        }
    }

    deserializer.deserialize_any(TransitionsVisitor)
}
