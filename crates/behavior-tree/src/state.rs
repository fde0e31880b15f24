//! Session state shared by every node during a tick.
//!
//! [`State`] is a loosely typed variable map: names map to JSON values, and a
//! variable that is absent or holds `null` is considered uninitialised. The
//! host creates one `State` per agent session and lends it to the tree for
//! the duration of each tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// Mutable variable map observed and modified by nodes during a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    variables: BTreeMap<String, Value>,
    /// Bumped on every mutation. Not part of the serialized form.
    #[serde(skip)]
    revision: u64,
}

impl State {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty state tagged with a session identifier.
    pub fn with_uid(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            ..Self::default()
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Returns the value of an initialised variable.
    ///
    /// Absent variables and variables holding `null` both yield `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).filter(|value| !value.is_null())
    }

    /// Returns `true` if the variable is initialised (present and not `null`).
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Writes a variable, returning its previous value.
    ///
    /// Rewriting a variable with the value it already holds leaves the
    /// revision unchanged.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        if self.variables.get(&name) != Some(&value) {
            self.revision += 1;
        }
        self.variables.insert(name, value)
    }

    /// Removes a variable, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.variables.remove(name);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Removes every variable.
    pub fn clear(&mut self) {
        if !self.variables.is_empty() {
            self.revision += 1;
            self.variables.clear();
        }
    }

    /// Read-only view of all stored variables, including `null` ones.
    pub fn vars(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Change counter. Two equal revisions mean the variables are unchanged
    /// in between.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Converts the state into its `{ "uid": ..., "variables": {...} }` form.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "uid": self.uid,
            "variables": self.variables,
        })
    }

    /// Restores a state from the form produced by [`State::to_json`].
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl<K, V> FromIterator<(K, V)> for State
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            variables: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
            ..Self::default()
        }
    }
}
