//! Construction of nodes from configuration records.
//!
//! [`NodeConfig`] is the validated, immutable description of one node as an
//! external configuration layer hands it over (typically as JSON).
//! [`NodeFactory`] turns it into a [`Node`], looking up host leaves by kind in
//! a registry of constructors.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::builder;
use crate::composite::{Resume, Strategy};
use crate::error::{BuildError, LeafError};
use crate::node::Node;
use crate::state::Value;
use crate::task::{Assign, Clear, Evaluate, Reset};
use crate::{AsyncBehavior, Behavior};

/// Configuration record of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKindConfig,
}

/// Variant specific part of a [`NodeConfig`], tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKindConfig {
    Selector {
        #[serde(default)]
        resume: Resume,
        children: Vec<NodeConfig>,
    },
    Sequence {
        #[serde(default)]
        resume: Resume,
        children: Vec<NodeConfig>,
    },
    Evaluate(Evaluate),
    Assign {
        assignments: BTreeMap<String, Value>,
    },
    Reset {
        target: String,
    },
    Clear {
        #[serde(default)]
        variables: Vec<String>,
    },
    /// Host leaf registered in the [`NodeFactory`] under `kind`.
    Leaf {
        kind: String,
        #[serde(default)]
        params: Value,
    },
}

impl NodeConfig {
    pub fn new(kind: NodeKindConfig) -> Self {
        Self { name: None, kind }
    }

    pub fn from_json(value: Value) -> Result<Self, BuildError> {
        Ok(serde_json::from_value(value)?)
    }
}

type LeafConstructor = Box<dyn Fn(&Value) -> Result<Node, LeafError> + Send + Sync>;

/// Builds nodes from [`NodeConfig`] records.
#[derive(Default)]
pub struct NodeFactory {
    leaves: HashMap<String, LeafConstructor>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw constructor for leaf `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<Node, LeafError> + Send + Sync + 'static,
    {
        self.leaves.insert(kind.into(), Box::new(constructor));
        self
    }

    /// Registers a synchronous leaf whose parameters deserialize into `P`.
    pub fn register_leaf<P, B, F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        P: DeserializeOwned,
        B: Behavior + 'static,
        F: Fn(P) -> B + Send + Sync + 'static,
    {
        self.register(kind, move |params| {
            let params = serde_json::from_value(params.clone())?;
            Ok(builder::leaf(constructor(params)))
        })
    }

    /// Registers a suspending leaf whose parameters deserialize into `P`.
    pub fn register_async_leaf<P, B, F>(
        &mut self,
        kind: impl Into<String>,
        constructor: F,
    ) -> &mut Self
    where
        P: DeserializeOwned,
        B: AsyncBehavior + 'static,
        F: Fn(P) -> B + Send + Sync + 'static,
    {
        self.register(kind, move |params| {
            let params = serde_json::from_value(params.clone())?;
            Ok(builder::async_leaf(constructor(params)))
        })
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.leaves.contains_key(kind)
    }

    /// Builds a node and, recursively, its children.
    pub fn build(&self, config: &NodeConfig) -> Result<Node, BuildError> {
        let node = match &config.kind {
            NodeKindConfig::Selector { resume, children } => {
                builder::composite(Strategy::Selector, *resume, self.build_all(children)?)
            }
            NodeKindConfig::Sequence { resume, children } => {
                builder::composite(Strategy::Sequence, *resume, self.build_all(children)?)
            }
            NodeKindConfig::Evaluate(evaluate) => Node::from(evaluate.clone()),
            NodeKindConfig::Assign { assignments } => Node::from(Assign::new(assignments.clone())),
            NodeKindConfig::Reset { target } => builder::reset(target.as_str()),
            NodeKindConfig::Clear { variables } => builder::clear(variables.iter().cloned()),
            NodeKindConfig::Leaf { kind, params } => {
                let constructor = self
                    .leaves
                    .get(kind)
                    .ok_or_else(|| BuildError::UnknownLeafKind(kind.clone()))?;
                constructor(params).map_err(|source| BuildError::InvalidLeafParams {
                    kind: kind.clone(),
                    source,
                })?
            }
        };

        Ok(match &config.name {
            Some(name) => node.named(name.as_str()),
            None => node,
        })
    }

    /// Parses a JSON record and builds it.
    pub fn build_json(&self, value: Value) -> Result<Node, BuildError> {
        self.build(&NodeConfig::from_json(value)?)
    }

    fn build_all(&self, children: &[NodeConfig]) -> Result<Vec<Node>, BuildError> {
        children.iter().map(|child| self.build(child)).collect()
    }
}

impl fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.leaves.keys().collect();
        kinds.sort();
        f.debug_struct("NodeFactory").field("leaves", &kinds).finish()
    }
}

impl From<Reset> for NodeKindConfig {
    fn from(reset: Reset) -> Self {
        NodeKindConfig::Reset {
            target: reset.target().to_owned(),
        }
    }
}

impl From<Clear> for NodeKindConfig {
    fn from(clear: Clear) -> Self {
        NodeKindConfig::Clear {
            variables: clear.variables().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::NodeKind;
    use crate::state::State;
    use crate::{Status, Tree, TreeConfig};

    #[derive(Deserialize)]
    struct Fixed {
        status: Status,
    }

    impl Behavior for Fixed {
        fn tick(&self, _state: &mut State) -> Result<Status, LeafError> {
            Ok(self.status)
        }
    }

    fn factory() -> NodeFactory {
        let mut factory = NodeFactory::new();
        factory.register_leaf("fixed", |fixed: Fixed| fixed);
        factory
    }

    #[test]
    fn builds_nested_records() {
        let node = factory()
            .build_json(json!({
                "type": "sequence",
                "name": "engage",
                "resume": "cursor",
                "children": [
                    { "type": "assign", "assignments": { "x": 5 } },
                    { "type": "evaluate", "conditions": { "x": [{ "op": "more", "value": 3 }] } },
                    { "type": "leaf", "kind": "fixed", "params": { "status": "RUNNING" } }
                ]
            }))
            .unwrap();

        assert_eq!(node.name(), Some("engage"));
        assert!(node.is_persistent());
        assert_eq!(node.children().len(), 3);
        assert!(matches!(node.children()[2].kind(), NodeKind::Leaf(_)));

        let mut tree = Tree::new(node, TreeConfig::default()).unwrap();
        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(tree.cursor("0"), Some(2));
    }

    #[test]
    fn unknown_leaf_kind_is_rejected() {
        let err = factory()
            .build_json(json!({ "type": "leaf", "kind": "teleport" }))
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownLeafKind(kind) if kind == "teleport"));
    }

    #[test]
    fn bad_leaf_params_are_rejected() {
        let err = factory()
            .build_json(json!({ "type": "leaf", "kind": "fixed", "params": { "status": "MAYBE" } }))
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidLeafParams { .. }));
    }

    #[test]
    fn malformed_record_is_rejected() {
        let err = NodeConfig::from_json(json!({ "type": "selector" })).unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn config_records_round_trip_through_serde() {
        let config = NodeConfig {
            name: Some("cleanup".to_owned()),
            kind: Clear::new(["target"]).into(),
        };
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json, json!({ "name": "cleanup", "type": "clear", "variables": ["target"] }));
        assert_eq!(NodeConfig::from_json(json).unwrap(), config);
    }
}
