//! Variable removal.

use crate::state::State;
use crate::Status;

/// Leaf that uninitialises state variables. Always succeeds.
///
/// With an empty variable list every variable is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clear {
    variables: Vec<String>,
}

impl Clear {
    pub fn new<I, K>(variables: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// Clears every variable.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub(crate) fn tick(&self, state: &mut State) -> Status {
        if self.variables.is_empty() {
            tracing::debug!(count = state.len(), "clearing all state variables");
            state.clear();
        } else {
            for variable in &self.variables {
                state.remove(variable);
            }
        }
        Status::Success
    }
}
