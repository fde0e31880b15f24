//! Persistence reset.

use crate::composite::Cursor;
use crate::error::BuildError;
use crate::node::NodeId;
use crate::tree::Registry;
use crate::Status;

/// Leaf that forces a persistent controller to restart from its first child.
///
/// The target is addressed by its assigned identity and resolved when the tree
/// is prepared. Cursors of persistent controllers nested below the target are
/// cleared as well, so the whole branch starts over. Always succeeds.
#[derive(Debug, Clone)]
pub struct Reset {
    target: String,
    cursors: Vec<Cursor>,
}

impl Reset {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            cursors: Vec::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub(crate) fn resolve(
        &mut self,
        id: &NodeId,
        registry: &Registry,
    ) -> Result<(), BuildError> {
        if !registry.contains(&self.target) {
            return Err(BuildError::UnknownResetTarget {
                node: id.clone(),
                target: self.target.clone(),
            });
        }
        if !registry.is_persistent(&self.target) {
            return Err(BuildError::NotPersistent {
                node: id.clone(),
                target: self.target.clone(),
            });
        }
        self.cursors = registry.subtree_cursors(&self.target);
        Ok(())
    }

    pub(crate) fn tick(&self, id: &NodeId) -> Status {
        tracing::debug!(%id, target = %self.target, cursors = self.cursors.len(), "resetting persistent branch");
        for cursor in &self.cursors {
            cursor.clear();
        }
        Status::Success
    }
}
