//! Comparison-based evaluation of state variables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result, TickError};
use crate::node::NodeId;
use crate::state::{State, Value};
use crate::Status;

/// Comparison applied to one state variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Comparator {
    /// Variable is less than `value` (or equal, when not strict).
    Less {
        /// Compared as `f64`: integers beyond 2^53 lose precision.
        value: f64,
        #[serde(default = "strict_by_default")]
        strict: bool,
    },
    /// Variable is greater than `value` (or equal, when not strict).
    More {
        /// Compared as `f64`: integers beyond 2^53 lose precision.
        value: f64,
        #[serde(default = "strict_by_default")]
        strict: bool,
    },
    /// Variable equals `value`. Numbers compare numerically, so `1 == 1.0`.
    ///
    /// `null` is rejected when the tree is prepared, since a null variable
    /// counts as absent; use [`Comparator::IsNone`] instead.
    Equal { value: Value },
    /// Variable is an array sharing at least one element with `values`.
    Intersection { values: Vec<Value> },
    /// Variable is absent or `null`.
    IsNone,
}

fn strict_by_default() -> bool {
    true
}

impl Comparator {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Comparator::Less { .. } => "less",
            Comparator::More { .. } => "more",
            Comparator::Equal { .. } => "equal",
            Comparator::Intersection { .. } => "intersection",
            Comparator::IsNone => "is_none",
        }
    }

    fn check(&self, value: Option<&Value>) -> Outcome {
        let Some(value) = value else {
            return match self {
                Comparator::IsNone => Outcome::Holds(true),
                _ => Outcome::Missing,
            };
        };
        match self {
            Comparator::Less { value: bound, strict } => match value.as_f64() {
                Some(v) => Outcome::Holds(if *strict { v < *bound } else { v <= *bound }),
                None => Outcome::Mismatch,
            },
            Comparator::More { value: bound, strict } => match value.as_f64() {
                Some(v) => Outcome::Holds(if *strict { v > *bound } else { v >= *bound }),
                None => Outcome::Mismatch,
            },
            Comparator::Equal { value: expected } => Outcome::Holds(loosely_equal(value, expected)),
            Comparator::Intersection { values } => match value.as_array() {
                Some(items) => Outcome::Holds(
                    items
                        .iter()
                        .any(|item| values.iter().any(|v| loosely_equal(item, v))),
                ),
                None => Outcome::Mismatch,
            },
            Comparator::IsNone => Outcome::Holds(false),
        }
    }
}

enum Outcome {
    Holds(bool),
    Missing,
    Mismatch,
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// A comparator plus an optional negation of its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(flatten)]
    pub comparator: Comparator,
    #[serde(default)]
    pub invert: bool,
}

impl Condition {
    pub fn new(comparator: Comparator) -> Self {
        Self {
            comparator,
            invert: false,
        }
    }

    pub fn less(value: f64) -> Self {
        Self::new(Comparator::Less {
            value,
            strict: true,
        })
    }

    pub fn more(value: f64) -> Self {
        Self::new(Comparator::More {
            value,
            strict: true,
        })
    }

    pub fn equal(value: impl Into<Value>) -> Self {
        Self::new(Comparator::Equal {
            value: value.into(),
        })
    }

    pub fn intersects<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(Comparator::Intersection {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn is_none() -> Self {
        Self::new(Comparator::IsNone)
    }

    /// Negates the comparison result. Has no effect on missing variables.
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// Turns `less`/`more` into `<=`/`>=`.
    pub fn inclusive(mut self) -> Self {
        if let Comparator::Less { strict, .. } | Comparator::More { strict, .. } =
            &mut self.comparator
        {
            *strict = false;
        }
        self
    }
}

/// What an evaluation reports when a compared variable is uninitialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnMissing {
    /// Return `Failure`.
    #[default]
    Fail,
    /// Return `Running` until the variable shows up, unless another
    /// condition already fails.
    Wait,
}

/// Leaf that checks state variables against configured conditions.
///
/// Returns `Success` when every condition on every variable holds. Comparing
/// a variable whose value has the wrong type is reported as
/// [`TickError::Incomparable`] rather than treated as an unmet condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluate {
    conditions: BTreeMap<String, Vec<Condition>>,
    #[serde(default)]
    on_missing: OnMissing,
}

impl Evaluate {
    /// Creates an evaluation from `(variable, condition)` pairs. Several
    /// conditions may target the same variable.
    pub fn new<I, K>(conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, Condition)>,
        K: Into<String>,
    {
        let mut grouped: BTreeMap<String, Vec<Condition>> = BTreeMap::new();
        for (variable, condition) in conditions {
            grouped.entry(variable.into()).or_default().push(condition);
        }
        Self {
            conditions: grouped,
            on_missing: OnMissing::default(),
        }
    }

    pub fn on_missing(mut self, on_missing: OnMissing) -> Self {
        self.on_missing = on_missing;
        self
    }

    pub fn conditions(&self) -> &BTreeMap<String, Vec<Condition>> {
        &self.conditions
    }

    pub(crate) fn validate(&self, id: &NodeId) -> std::result::Result<(), BuildError> {
        if self.conditions.values().all(Vec::is_empty) {
            return Err(BuildError::NoConditions { node: id.clone() });
        }
        for (variable, conditions) in &self.conditions {
            let compares_null = conditions.iter().any(|condition| {
                matches!(&condition.comparator, Comparator::Equal { value } if value.is_null())
            });
            if compares_null {
                return Err(BuildError::NullComparison {
                    node: id.clone(),
                    variable: variable.clone(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn tick(&self, id: &NodeId, state: &State) -> Result<Status> {
        let mut result = Status::Success;

        for (variable, conditions) in &self.conditions {
            let value = state.get(variable);
            for condition in conditions {
                match condition.comparator.check(value) {
                    Outcome::Holds(holds) if holds != condition.invert => {}
                    Outcome::Holds(_) => return Ok(Status::Failure),
                    Outcome::Missing => match self.on_missing {
                        OnMissing::Fail => return Ok(Status::Failure),
                        OnMissing::Wait => result = Status::Running,
                    },
                    Outcome::Mismatch => {
                        return Err(TickError::Incomparable {
                            node: id.clone(),
                            variable: variable.clone(),
                            comparator: condition.comparator.as_str(),
                            value: value.cloned().unwrap_or(Value::Null),
                        });
                    }
                }
            }
        }

        Ok(result)
    }
}
