//! Node identity and dispatch.
//!
//! A [`Node`] pairs a positional identity with one variant of the closed
//! [`NodeKind`] set. Controllers own their children; there are no back
//! references, and identities are assigned once while the owning
//! [`Tree`](crate::Tree) is prepared.

use std::borrow::Borrow;
use std::fmt;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::behavior::{AsyncBehavior, Behavior};
use crate::composite::Composite;
use crate::error::{BuildError, Result, TickError};
use crate::state::State;
use crate::task::{Assign, Clear, Evaluate, Reset};
use crate::tree::Registry;
use crate::Status;

/// Hierarchical node identity, e.g. `0.2.1` for the second child of the third
/// child of root `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity of the child at `index`.
    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}.{}", self.0, index))
    }

    /// Returns `true` if `self` is `ancestor` or lies below it.
    pub fn is_within(&self, ancestor: &str) -> bool {
        match self.0.strip_prefix(ancestor) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The closed set of node variants the engine dispatches on.
pub enum NodeKind {
    Composite(Composite),
    Evaluate(Evaluate),
    Assign(Assign),
    Reset(Reset),
    Clear(Clear),
    /// Host leaf that completes within the call.
    Leaf(Box<dyn Behavior>),
    /// Host leaf that may suspend; requires the asynchronous tick path.
    AsyncLeaf(Box<dyn AsyncBehavior>),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Composite(composite) => composite.strategy().as_str(),
            NodeKind::Evaluate(_) => "evaluate",
            NodeKind::Assign(_) => "assign",
            NodeKind::Reset(_) => "reset",
            NodeKind::Clear(_) => "clear",
            NodeKind::Leaf(_) => "leaf",
            NodeKind::AsyncLeaf(_) => "async_leaf",
        }
    }
}

/// One position in a behavior tree.
pub struct Node {
    id: NodeId,
    name: Option<String>,
    debug: bool,
    kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::default(),
            name: None,
            debug: false,
            kind,
        }
    }

    /// Attaches a human readable name used in diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Identity assigned during preparation. Empty until the node joins a tree.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Child nodes in execution order. Empty for leaves.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Composite(composite) => composite.children(),
            _ => &[],
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(&self.kind, NodeKind::Composite(c) if c.resume().is_persistent())
    }

    /// Assigns `id` to this node and dotted child identities below it.
    ///
    /// Also validates the node's configuration and records it in the tree's
    /// identity table.
    pub(crate) fn prepare(
        &mut self,
        id: NodeId,
        registry: &mut Registry,
    ) -> std::result::Result<(), BuildError> {
        self.debug = registry.debug();
        match &mut self.kind {
            NodeKind::Composite(composite) => {
                composite.validate(&id)?;
                if composite.resume().is_persistent() {
                    registry.register_cursor(&id, composite.cursor().clone());
                }
                for (index, child) in composite.children_mut().iter_mut().enumerate() {
                    child.prepare(id.child(index), registry)?;
                }
            }
            NodeKind::Evaluate(evaluate) => evaluate.validate(&id)?,
            NodeKind::AsyncLeaf(_) => registry.mark_async(),
            NodeKind::Assign(_) | NodeKind::Reset(_) | NodeKind::Clear(_) | NodeKind::Leaf(_) => {}
        }
        registry.register(&id);
        self.id = id;
        Ok(())
    }

    /// Resolves cross references against the fully populated identity table.
    pub(crate) fn resolve(&mut self, registry: &Registry) -> std::result::Result<(), BuildError> {
        match &mut self.kind {
            NodeKind::Reset(reset) => reset.resolve(&self.id, registry),
            NodeKind::Composite(composite) => composite
                .children_mut()
                .iter_mut()
                .try_for_each(|child| child.resolve(registry)),
            _ => Ok(()),
        }
    }

    /// Ticks this node on the blocking path.
    ///
    /// Suspending leaves are never reached here: the tree refuses blocking
    /// ticks when it contains any.
    pub fn tick(&self, state: &mut State) -> Result<Status> {
        let status = match &self.kind {
            NodeKind::Composite(composite) => composite.tick(&self.id, state)?,
            NodeKind::Evaluate(evaluate) => evaluate.tick(&self.id, state)?,
            NodeKind::Assign(assign) => assign.tick(state),
            NodeKind::Reset(reset) => reset.tick(&self.id),
            NodeKind::Clear(clear) => clear.tick(state),
            NodeKind::Leaf(leaf) => leaf.tick(state).map_err(|source| TickError::Leaf {
                node: self.id.clone(),
                source,
            })?,
            NodeKind::AsyncLeaf(_) => return Err(TickError::RequiresAsync),
        };
        self.trace(status, state);
        Ok(status)
    }

    /// Ticks this node on the suspending path.
    ///
    /// Only composites and suspending leaves await; every other variant runs
    /// exactly as in [`Node::tick`].
    pub fn tick_async<'a>(&'a self, state: &'a mut State) -> BoxFuture<'a, Result<Status>> {
        async move {
            let status = match &self.kind {
                NodeKind::Composite(composite) => composite.tick_async(&self.id, state).await?,
                NodeKind::AsyncLeaf(leaf) => {
                    leaf.tick(state).await.map_err(|source| TickError::Leaf {
                        node: self.id.clone(),
                        source,
                    })?
                }
                _ => return self.tick(state),
            };
            self.trace(status, state);
            Ok(status)
        }
        .boxed()
    }

    fn trace(&self, status: Status, state: &State) {
        if self.debug {
            tracing::debug!(
                target: "behavior_tree::tick",
                id = %self.id,
                name = ?self.name,
                %status,
                state = %state.to_json(),
                "node ticked"
            );
        } else {
            tracing::trace!(
                target: "behavior_tree::tick",
                id = %self.id,
                name = ?self.name,
                %status,
                "node ticked"
            );
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .field("children", &self.children())
            .finish()
    }
}
