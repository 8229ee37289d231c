//! Builder API for ergonomic workflow construction.
//!
//! [`DefinitionBuilder`] assembles and validates a [`Definition`](crate::core::Definition);
//! [`WorkflowBuilder`] binds it to a marking store, an event dispatcher and
//! guards.

pub mod definition;
pub mod error;
pub mod transition;
pub mod workflow;

pub use definition::DefinitionBuilder;
pub use error::BuildError;
pub use transition::TransitionBuilder;
pub use workflow::WorkflowBuilder;

use crate::workflow::Workflow;

/// Build a state machine walking `places` in order, one transition per step.
///
/// Transition `i` is called `steps[i]` and moves from `places[i]` to
/// `places[i + 1]`. The first place is the initial place. There must be
/// exactly one step fewer than places.
///
/// # Example
///
/// ```
/// use placemark::builder::linear_state_machine;
///
/// let workflow = linear_state_machine(
///     "blog",
///     ["draft", "reviewed", "published"],
///     ["review", "publish"],
/// )
/// .unwrap();
///
/// assert_eq!(workflow.definition().transitions().len(), 2);
/// ```
pub fn linear_state_machine<P, T>(
    name: impl Into<String>,
    places: impl IntoIterator<Item = P>,
    steps: impl IntoIterator<Item = T>,
) -> Result<Workflow, BuildError>
where
    P: Into<String>,
    T: Into<String>,
{
    let places: Vec<String> = places.into_iter().map(Into::into).collect();
    let steps: Vec<String> = steps.into_iter().map(Into::into).collect();

    let expected = places.len().saturating_sub(1);
    if steps.len() != expected {
        return Err(BuildError::StepCountMismatch {
            places: places.len(),
            expected,
            steps: steps.len(),
        });
    }

    let mut builder = DefinitionBuilder::state_machine().places(places.iter().cloned());
    for (step, pair) in steps.into_iter().zip(places.windows(2)) {
        builder = builder.transition(step, [pair[0].as_str()], [pair[1].as_str()]);
    }
    if let Some(first) = places.first() {
        builder = builder.initial_place(first.as_str());
    }

    Ok(WorkflowBuilder::new(name, builder.build()?).build())
}
