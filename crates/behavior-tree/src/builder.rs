//! Builder utilities for ergonomic behavior tree construction.
//!
//! This module provides helper functions to reduce boilerplate when building
//! behavior trees. Instead of writing verbose
//! `Node::new(NodeKind::Composite(Composite::new(...)))`, you can use shorter
//! functions like `sequence(vec![...])`. Validation is deferred to
//! [`Tree::new`](crate::Tree::new).

use crate::composite::{Composite, Resume, Strategy};
use crate::node::{Node, NodeKind};
use crate::state::Value;
use crate::task::{Assign, Clear, Condition, Evaluate, Reset};
use crate::{AsyncBehavior, Behavior};

/// Creates a composite node with an explicit strategy and resume policy.
#[inline]
pub fn composite(strategy: Strategy, resume: Resume, children: Vec<Node>) -> Node {
    Node::new(NodeKind::Composite(Composite::new(strategy, resume, children)))
}

/// Creates a non-persistent sequence node.
#[inline]
pub fn sequence(children: Vec<Node>) -> Node {
    composite(Strategy::Sequence, Resume::Restart, children)
}

/// Creates a non-persistent selector node.
#[inline]
pub fn selector(children: Vec<Node>) -> Node {
    composite(Strategy::Selector, Resume::Restart, children)
}

/// Creates a sequence that resumes at its running child.
#[inline]
pub fn persistent_sequence(children: Vec<Node>) -> Node {
    composite(Strategy::Sequence, Resume::Cursor, children)
}

/// Creates a selector that resumes at its running child.
#[inline]
pub fn persistent_selector(children: Vec<Node>) -> Node {
    composite(Strategy::Selector, Resume::Cursor, children)
}

/// Creates an evaluation node from `(variable, condition)` pairs.
#[inline]
pub fn evaluate<I, K>(conditions: I) -> Node
where
    I: IntoIterator<Item = (K, Condition)>,
    K: Into<String>,
{
    Node::new(NodeKind::Evaluate(Evaluate::new(conditions)))
}

/// Creates an assignment node from `(variable, value)` pairs.
#[inline]
pub fn assign<I, K, V>(assignments: I) -> Node
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    Node::new(NodeKind::Assign(Assign::new(assignments)))
}

/// Creates a reset node targeting the persistent controller with identity `target`.
#[inline]
pub fn reset(target: impl Into<String>) -> Node {
    Node::new(NodeKind::Reset(Reset::new(target)))
}

/// Creates a node that uninitialises the given variables (all, if empty).
#[inline]
pub fn clear<I, K>(variables: I) -> Node
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    Node::new(NodeKind::Clear(Clear::new(variables)))
}

/// Wraps a synchronous host leaf.
#[inline]
pub fn leaf(behavior: impl Behavior + 'static) -> Node {
    Node::new(NodeKind::Leaf(Box::new(behavior)))
}

/// Wraps a suspending host leaf.
#[inline]
pub fn async_leaf(behavior: impl AsyncBehavior + 'static) -> Node {
    Node::new(NodeKind::AsyncLeaf(Box::new(behavior)))
}

impl From<Evaluate> for Node {
    fn from(evaluate: Evaluate) -> Self {
        Node::new(NodeKind::Evaluate(evaluate))
    }
}

impl From<Assign> for Node {
    fn from(assign: Assign) -> Self {
        Node::new(NodeKind::Assign(assign))
    }
}
