//! Structural checks on a configuration document.

use super::{ConfigError, WorkflowConfig, WorkflowEntry};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// One problem in a configuration document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("workflow '{workflow}': marking_store \"type\" and \"service\" cannot be used together")]
    StoreTypeAndService { workflow: String },

    #[error("workflow '{workflow}': marking_store \"arguments\" require a \"type\"")]
    StoreArgumentsWithoutType { workflow: String },

    #[error("workflow '{workflow}': \"supports\" and \"support_strategy\" cannot be used together")]
    SupportsAndStrategy { workflow: String },

    #[error("workflow '{workflow}': one of \"supports\" or \"support_strategy\" must be configured")]
    MissingSupports { workflow: String },

    #[error("workflow '{workflow}' must declare at least one place")]
    NoPlaces { workflow: String },

    #[error("workflow '{workflow}' must declare at least one transition")]
    NoTransitions { workflow: String },

    #[error("workflow '{workflow}': transition '{transition}' needs at least one \"{side}\" place")]
    EmptyArcs {
        workflow: String,
        transition: String,
        side: &'static str,
    },

    #[error("workflow '{workflow}': \"initial_place\" and \"initial_places\" cannot be used together")]
    InitialPlaceAndPlaces { workflow: String },
}

type Checks = Vec<Validation<(), NonEmptyVec<ConfigViolation>>>;

impl WorkflowConfig {
    /// Check every workflow, reporting all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: Checks = self
            .workflows
            .iter()
            .flat_map(|(name, entry)| check_entry(name, entry))
            .collect();

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(violations) => Err(ConfigError::Invalid {
                violations: violations.iter().cloned().collect(),
            }),
        }
    }
}

fn check_entry(name: &str, entry: &WorkflowEntry) -> Checks {
    let workflow = || name.to_string();
    let mut checks = Checks::new();

    let store = &entry.marking_store;
    if store.store_type.is_some() && store.service.is_some() {
        checks.push(Validation::fail(ConfigViolation::StoreTypeAndService {
            workflow: workflow(),
        }));
    }
    if store.store_type.is_none() && !store.arguments.is_empty() {
        checks.push(Validation::fail(ConfigViolation::StoreArgumentsWithoutType {
            workflow: workflow(),
        }));
    }

    match (entry.supports.is_empty(), entry.support_strategy.is_some()) {
        (false, true) => checks.push(Validation::fail(ConfigViolation::SupportsAndStrategy {
            workflow: workflow(),
        })),
        (true, false) => checks.push(Validation::fail(ConfigViolation::MissingSupports {
            workflow: workflow(),
        })),
        _ => {}
    }

    if entry.places.is_empty() {
        checks.push(Validation::fail(ConfigViolation::NoPlaces {
            workflow: workflow(),
        }));
    }
    if entry.transitions.is_empty() {
        checks.push(Validation::fail(ConfigViolation::NoTransitions {
            workflow: workflow(),
        }));
    }
    for transition in &entry.transitions {
        for (side, places) in [("from", &transition.from), ("to", &transition.to)] {
            if places.is_empty() {
                checks.push(Validation::fail(ConfigViolation::EmptyArcs {
                    workflow: workflow(),
                    transition: transition.name.clone(),
                    side,
                }));
            }
        }
    }

    if entry.initial_place.is_some() && !entry.initial_places.is_empty() {
        checks.push(Validation::fail(ConfigViolation::InitialPlaceAndPlaces {
            workflow: workflow(),
        }));
    }

    checks
}
