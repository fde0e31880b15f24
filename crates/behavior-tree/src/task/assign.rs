//! Variable assignment.

use std::fmt;
use std::sync::Arc;

use crate::state::{State, Value};
use crate::Status;

type Compute = Arc<dyn Fn(&State) -> Value + Send + Sync>;

/// Where an assigned value comes from.
#[derive(Clone)]
pub enum Source {
    Literal(Value),
    /// Computed from the state as it is at the moment of assignment.
    Computed(Compute),
}

impl Source {
    fn resolve(&self, state: &State) -> Value {
        match self {
            Source::Literal(value) => value.clone(),
            Source::Computed(compute) => compute(state),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Source::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Leaf that writes values into state variables, in order. Always succeeds.
#[derive(Debug, Clone, Default)]
pub struct Assign {
    assignments: Vec<(String, Source)>,
}

impl Assign {
    /// Creates an assignment of literal values.
    pub fn new<I, K, V>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            assignments: assignments
                .into_iter()
                .map(|(name, value)| (name.into(), Source::Literal(value.into())))
                .collect(),
        }
    }

    /// Appends a literal assignment.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments
            .push((name.into(), Source::Literal(value.into())));
        self
    }

    /// Appends an assignment computed from the state when the node runs.
    ///
    /// Earlier assignments of the same node are already visible to `compute`.
    pub fn compute<F>(mut self, name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&State) -> Value + Send + Sync + 'static,
    {
        self.assignments
            .push((name.into(), Source::Computed(Arc::new(compute))));
        self
    }

    pub fn assignments(&self) -> &[(String, Source)] {
        &self.assignments
    }

    pub(crate) fn tick(&self, state: &mut State) -> Status {
        for (name, source) in &self.assignments {
            let value = source.resolve(state);
            state.set(name.as_str(), value);
        }
        Status::Success
    }
}
