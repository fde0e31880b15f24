//! Error types surfaced while building and ticking trees.
//!
//! Construction problems are reported as [`BuildError`] before the first tick
//! and never show up mid-tick. [`TickError`] covers malformed state and host
//! leaf failures; it aborts the current tick without committing any cursor on
//! the failing path.

use thiserror::Error;

use crate::node::NodeId;
use crate::state::Value;

/// Error type host leaves report when their external interaction fails.
pub type LeafError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = TickError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{kind} node {node} must have at least one child")]
    EmptyComposite { node: NodeId, kind: &'static str },

    #[error("sequence node {node} cannot recheck earlier children on resume")]
    RecheckOnSequence { node: NodeId },

    #[error("evaluation node {node} has no conditions")]
    NoConditions { node: NodeId },

    #[error("evaluation node {node} compares `{variable}` with null, which never holds; use `is_none`")]
    NullComparison { node: NodeId, variable: String },

    #[error("unknown leaf kind `{0}`")]
    UnknownLeafKind(String),

    #[error("invalid parameters for leaf kind `{kind}`")]
    InvalidLeafParams {
        kind: String,
        #[source]
        source: LeafError,
    },

    #[error("malformed node config")]
    Config(#[from] serde_json::Error),

    #[error("reset target `{target}` referenced by node {node} does not exist")]
    UnknownResetTarget { node: NodeId, target: String },

    #[error("reset target `{target}` referenced by node {node} is not a persistent controller")]
    NotPersistent { node: NodeId, target: String },
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("node {node}: `{variable}` holds {value}, which `{comparator}` cannot compare")]
    Incomparable {
        node: NodeId,
        variable: String,
        comparator: &'static str,
        value: Value,
    },

    #[error("node {node} failed")]
    Leaf {
        node: NodeId,
        #[source]
        source: LeafError,
    },

    #[error("tree contains suspending leaves and must be ticked with `tick_async`")]
    RequiresAsync,
}

impl TickError {
    /// Identity of the node that raised the error, if any.
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Self::Incomparable { node, .. } | Self::Leaf { node, .. } => Some(node),
            Self::RequiresAsync => None,
        }
    }
}
