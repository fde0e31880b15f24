//! Tree preparation and the tick entry points.
//!
//! [`Tree`] owns the root node and the identity table built while preparing
//! it. Preparation happens exactly once, inside [`Tree::new`]; afterwards the
//! tree is ticked against a host-owned [`State`]. [`Driver`] bundles a tree
//! with the one state instance of an agent session.

use std::collections::{BTreeMap, BTreeSet};

use crate::composite::Cursor;
use crate::config::TreeConfig;
use crate::error::{BuildError, Result, TickError};
use crate::factory::{NodeConfig, NodeFactory};
use crate::node::{Node, NodeId};
use crate::state::State;
use crate::Status;

/// Identity table filled while a tree is prepared.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    debug: bool,
    asynchronous: bool,
    nodes: BTreeSet<NodeId>,
    cursors: BTreeMap<NodeId, Cursor>,
}

impl Registry {
    fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    pub(crate) fn register(&mut self, id: &NodeId) {
        self.nodes.insert(id.clone());
    }

    pub(crate) fn register_cursor(&mut self, id: &NodeId, cursor: Cursor) {
        self.cursors.insert(id.clone(), cursor);
    }

    pub(crate) fn mark_async(&mut self) {
        self.asynchronous = true;
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub(crate) fn is_persistent(&self, id: &str) -> bool {
        self.cursors.contains_key(id)
    }

    /// Cursors of `root` and of every persistent controller below it.
    pub(crate) fn subtree_cursors(&self, root: &str) -> Vec<Cursor> {
        self.cursors
            .iter()
            .filter(|(id, _)| id.is_within(root))
            .map(|(_, cursor)| cursor.clone())
            .collect()
    }
}

/// A prepared behavior tree.
#[derive(Debug)]
pub struct Tree {
    root: Node,
    registry: Registry,
    config: TreeConfig,
}

impl Tree {
    /// Prepares `root`: assigns identities, validates every node and resolves
    /// reset targets.
    pub fn new(mut root: Node, config: TreeConfig) -> std::result::Result<Self, BuildError> {
        let mut registry = Registry::new(config.debug);
        root.prepare(NodeId::new(config.root_id.as_str()), &mut registry)?;
        root.resolve(&registry)?;

        tracing::debug!(
            root = %root.id(),
            nodes = registry.nodes.len(),
            persistent = registry.cursors.len(),
            asynchronous = registry.asynchronous,
            "behavior tree prepared"
        );

        Ok(Self {
            root,
            registry,
            config,
        })
    }

    /// Builds the root from a configuration record and prepares it.
    pub fn from_config(
        node: &NodeConfig,
        factory: &NodeFactory,
        config: TreeConfig,
    ) -> std::result::Result<Self, BuildError> {
        Self::new(factory.build(node)?, config)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Returns `true` if the tree contains suspending leaves and therefore
    /// has to be ticked with [`Tree::tick_async`].
    pub fn requires_async(&self) -> bool {
        self.registry.asynchronous
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// All assigned identities, in lexicographic order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.registry.nodes.iter()
    }

    /// Index of the child a persistent controller will resume at, if any.
    pub fn cursor(&self, id: &str) -> Option<usize> {
        self.registry
            .cursors
            .get(id)
            .and_then(Cursor::get)
            .map(|mark| mark.index)
    }

    /// Clears the cursors of the persistent controllers at and below `id`.
    ///
    /// Returns `false` if no node has that identity.
    pub fn reset(&mut self, id: &str) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        for cursor in self.registry.subtree_cursors(id) {
            cursor.clear();
        }
        tracing::trace!(%id, "branch reset by host");
        true
    }

    /// Ticks the root once and returns its status.
    ///
    /// Fails with [`TickError::RequiresAsync`] before running any node if the
    /// tree contains suspending leaves.
    pub fn tick(&mut self, state: &mut State) -> Result<Status> {
        if self.registry.asynchronous {
            return Err(TickError::RequiresAsync);
        }
        self.root.tick(state)
    }

    /// Ticks the root once on the suspending path.
    ///
    /// Children are still awaited strictly in order. Dropping the future
    /// abandons the tick and leaves every cursor on the abandoned path as it
    /// was before the tick started.
    pub async fn tick_async(&mut self, state: &mut State) -> Result<Status> {
        self.root.tick_async(state).await
    }
}

/// A tree together with the state of one agent session.
pub struct Driver {
    tree: Tree,
    state: State,
}

impl Driver {
    pub fn new(tree: Tree, state: State) -> Self {
        Self { tree, state }
    }

    pub fn tick(&mut self) -> Result<Status> {
        self.tree.tick(&mut self.state)
    }

    pub async fn tick_async(&mut self) -> Result<Status> {
        self.tree.tick_async(&mut self.state).await
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable access for feeding external observations between ticks.
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn into_parts(self) -> (Tree, State) {
        (self.tree, self.state)
    }
}
