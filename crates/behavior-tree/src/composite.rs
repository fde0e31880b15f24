//! Composite behavior nodes.
//!
//! Composite nodes control the execution flow of their children. A single
//! [`Composite`] type covers both fundamental traversals, [`Strategy::Sequence`]
//! (AND logic) and [`Strategy::Selector`] (OR logic), and a [`Resume`] policy
//! decides whether a child that returned `Running` is resumed directly on the
//! next tick or the traversal restarts from the first child.
//!
//! The blocking and the suspending tick paths share the same traversal rules:
//! children are visited strictly left to right, one at a time, and the cursor
//! is only written at the moment the composite returns a status. Abandoning a
//! suspended tick therefore leaves every cursor on that path untouched.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};
use crate::node::{Node, NodeId};
use crate::state::State;
use crate::Status;

/// Traversal strategy of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Moves on while children succeed. The first `Failure` or `Running`
    /// becomes the composite's status; a sequence whose every child
    /// succeeded succeeds.
    Sequence,

    /// Moves on while children fail, trying alternatives in priority order.
    /// The first `Success` or `Running` becomes the composite's status; a
    /// selector whose every child failed fails.
    Selector,
}

impl Strategy {
    /// Child status that lets the traversal move on to the next sibling.
    ///
    /// It is also the composite's result once every child has been visited.
    #[inline]
    pub fn proceeds_on(self) -> Status {
        match self {
            Strategy::Sequence => Status::Success,
            Strategy::Selector => Status::Failure,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Sequence => "sequence",
            Strategy::Selector => "selector",
        }
    }
}

/// Where a composite starts its traversal on the next tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resume {
    /// Non-persistent: every tick starts at the first child.
    #[default]
    Restart,

    /// Persistent: a child that returned `Running` is resumed directly, and
    /// earlier siblings are skipped until the composite finishes.
    Cursor,

    /// Persistent selector that resumes the running child only while the state
    /// is unchanged since the cursor was stored. Any change in between (by the
    /// host or by nodes ticked earlier in the same tick) re-evaluates the
    /// higher priority siblings from the first child. Rewriting a variable
    /// with the value it already holds is not a change.
    CursorUnlessChanged,
}

impl Resume {
    /// Returns `true` if the composite keeps a cursor between ticks.
    #[inline]
    pub fn is_persistent(self) -> bool {
        !matches!(self, Resume::Restart)
    }
}

/// Position stored by a persistent composite when a child returned `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    /// Index of the running child.
    pub index: usize,
    /// [`State::revision`] at the moment the cursor was stored.
    pub revision: u64,
}

/// Cursor cell of one persistent composite.
///
/// Owned by the composite. The tree keeps a clone in its identity table so
/// reset nodes and [`Tree::reset`](crate::Tree::reset) can clear it.
#[derive(Debug, Clone, Default)]
pub struct Cursor(Arc<Mutex<Option<Mark>>>);

impl Cursor {
    /// Returns the stored mark, if any.
    pub fn get(&self) -> Option<Mark> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    pub(crate) fn store(&self, mark: Mark) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(mark);
    }

    pub(crate) fn clear(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// A controller node: ordered children, a traversal strategy and a resume policy.
pub struct Composite {
    strategy: Strategy,
    resume: Resume,
    children: Vec<Node>,
    cursor: Cursor,
}

impl Composite {
    /// Creates a new composite with the given child nodes.
    ///
    /// Validation happens when the owning tree is prepared: empty composites
    /// and recheck-on-resume sequences are rejected there.
    pub fn new(strategy: Strategy, resume: Resume, children: Vec<Node>) -> Self {
        Self {
            strategy,
            resume,
            children,
            cursor: Cursor::default(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn resume(&self) -> Resume {
        self.resume
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub(crate) fn validate(&self, id: &NodeId) -> std::result::Result<(), BuildError> {
        if self.children.is_empty() {
            return Err(BuildError::EmptyComposite {
                node: id.clone(),
                kind: self.strategy.as_str(),
            });
        }
        if self.strategy == Strategy::Sequence && self.resume == Resume::CursorUnlessChanged {
            return Err(BuildError::RecheckOnSequence { node: id.clone() });
        }
        Ok(())
    }

    pub(crate) fn tick(&self, id: &NodeId, state: &mut State) -> Result<Status> {
        let start = self.start(id, state);
        // Errors propagate before `finish`, so the cursor keeps its pre-tick value
        for (index, child) in self.children.iter().enumerate().skip(start) {
            let status = child.tick(state)?;
            if status != self.strategy.proceeds_on() {
                return Ok(self.finish(id, index, status, state));
            }
        }
        Ok(self.finish(id, self.children.len(), self.strategy.proceeds_on(), state))
    }

    pub(crate) async fn tick_async(&self, id: &NodeId, state: &mut State) -> Result<Status> {
        let start = self.start(id, state);
        for (index, child) in self.children.iter().enumerate().skip(start) {
            let status = child.tick_async(state).await?;
            if status != self.strategy.proceeds_on() {
                return Ok(self.finish(id, index, status, state));
            }
        }
        Ok(self.finish(id, self.children.len(), self.strategy.proceeds_on(), state))
    }

    fn start(&self, id: &NodeId, state: &State) -> usize {
        let Some(mark) = self.cursor.get() else {
            return 0;
        };
        let index = match self.resume {
            Resume::Restart => 0,
            Resume::Cursor => mark.index,
            Resume::CursorUnlessChanged if mark.revision == state.revision() => mark.index,
            Resume::CursorUnlessChanged => {
                tracing::trace!(%id, skipped = mark.index, "state changed, rechecking from first child");
                0
            }
        };
        if index > 0 {
            tracing::trace!(%id, index, "resuming from cursor");
        }
        index
    }

    fn finish(&self, id: &NodeId, index: usize, status: Status, state: &State) -> Status {
        if self.resume.is_persistent() {
            if status.is_running() {
                tracing::trace!(%id, index, "cursor stored");
                self.cursor.store(Mark {
                    index,
                    revision: state.revision(),
                });
            } else {
                self.cursor.clear();
            }
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::builder::{leaf, persistent_selector, persistent_sequence, selector, sequence};
    use crate::error::LeafError;
    use crate::{Behavior, Tree, TreeConfig};

    struct Increment;
    impl Behavior for Increment {
        fn tick(&self, state: &mut State) -> std::result::Result<Status, LeafError> {
            let value = state.get("value").and_then(|v| v.as_i64()).unwrap_or(0);
            state.set("value", value + 1);
            Ok(Status::Success)
        }
    }

    struct Decrement;
    impl Behavior for Decrement {
        fn tick(&self, state: &mut State) -> std::result::Result<Status, LeafError> {
            let value = state.get("value").and_then(|v| v.as_i64()).unwrap_or(0);
            state.set("value", value - 1);
            Ok(Status::Success)
        }
    }

    struct FailAlways;
    impl Behavior for FailAlways {
        fn tick(&self, _state: &mut State) -> std::result::Result<Status, LeafError> {
            Ok(Status::Failure)
        }
    }

    /// Returns the scripted statuses in order, repeating the last one.
    struct Scripted {
        statuses: Vec<Status>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(statuses: &[Status]) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let node = Self {
                statuses: statuses.to_vec(),
                calls: Arc::clone(&calls),
            };
            (node, calls)
        }
    }

    impl Behavior for Scripted {
        fn tick(&self, _state: &mut State) -> std::result::Result<Status, LeafError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.statuses[call.min(self.statuses.len() - 1)])
        }
    }

    /// Returns `Running` for the first `pending` calls, then `Success`.
    struct RunFor {
        pending: usize,
        calls: Arc<AtomicUsize>,
    }

    impl RunFor {
        fn new(pending: usize) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let node = Self {
                pending,
                calls: Arc::clone(&calls),
            };
            (node, calls)
        }
    }

    impl Behavior for RunFor {
        fn tick(&self, _state: &mut State) -> std::result::Result<Status, LeafError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.pending {
                Ok(Status::Running)
            } else {
                Ok(Status::Success)
            }
        }
    }

    fn value(state: &State) -> i64 {
        state.get("value").and_then(|v| v.as_i64()).unwrap_or(0)
    }

    fn tree(root: Node) -> Tree {
        Tree::new(root, TreeConfig::default()).unwrap()
    }

    #[test]
    fn sequence_all_success() {
        let mut tree = tree(sequence(vec![leaf(Increment), leaf(Increment)]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Success);
        assert_eq!(value(&state), 2);
    }

    #[test]
    fn sequence_fails_on_first_failure() {
        let mut tree = tree(sequence(vec![
            leaf(Increment),
            leaf(FailAlways),
            leaf(Increment), // Should not execute
        ]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Failure);
        assert_eq!(value(&state), 1); // Only first increment executed
    }

    #[test]
    fn selector_succeeds_on_first_success() {
        let mut tree = tree(selector(vec![
            leaf(FailAlways),
            leaf(Increment),
            leaf(Decrement), // Should not execute
        ]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Success);
        assert_eq!(value(&state), 1); // Only Increment executed
    }

    #[test]
    fn selector_fails_when_all_fail() {
        let mut tree = tree(selector(vec![leaf(FailAlways), leaf(FailAlways)]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Failure);
    }

    #[test]
    fn non_persistent_sequence_restarts_after_running() {
        let (runner, runs) = RunFor::new(1);
        let mut tree = tree(sequence(vec![leaf(Increment), leaf(runner)]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Success);

        assert_eq!(value(&state), 2); // first child ran on both ticks
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn persistent_sequence_skips_succeeded_children() {
        let (runner, runs) = RunFor::new(2);
        let mut tree = tree(persistent_sequence(vec![leaf(Increment), leaf(runner)]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(tree.cursor("0"), Some(1));
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Success);

        assert_eq!(value(&state), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(tree.cursor("0"), None);
    }

    #[test]
    fn persistent_selector_clears_cursor_on_success() {
        let (runner, _) = RunFor::new(1);
        let mut tree = tree(persistent_selector(vec![
            leaf(FailAlways),
            leaf(runner),
            leaf(FailAlways),
        ]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(tree.cursor("0"), Some(1));
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Success);
        assert_eq!(tree.cursor("0"), None);
    }

    #[test]
    fn persistent_selector_clears_cursor_when_all_fail() {
        let (first, first_calls) = Scripted::new(&[Status::Failure]);
        let (runner, _) = Scripted::new(&[Status::Running, Status::Failure]);
        let mut tree = tree(persistent_selector(vec![
            leaf(first),
            leaf(runner),
            leaf(FailAlways),
        ]));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(tree.cursor("0"), Some(1));

        // Resumed child fails, and so does the last one
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Failure);
        assert_eq!(tree.cursor("0"), None);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);

        // Next tick starts over at the first child
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Failure);
        assert_eq!(first_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn recheck_policy_restarts_when_state_changes() {
        let (first, first_calls) = RunFor::new(usize::MAX);
        let (runner, _) = RunFor::new(usize::MAX);
        let gate = crate::builder::evaluate([("alarm", crate::Condition::equal(true))]);
        let mut tree = tree(crate::builder::composite(
            Strategy::Selector,
            Resume::CursorUnlessChanged,
            vec![sequence(vec![gate, leaf(first)]), leaf(runner)],
        ));

        let mut state = State::new();
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(tree.cursor("0"), Some(1));

        // Unchanged state resumes at the cursor
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);

        // A change in between lets the higher priority branch preempt
        state.set("alarm", true);
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(tree.cursor("0"), Some(0));
    }

    #[test]
    fn recheck_policy_ignores_rewrites_of_the_same_value() {
        let (first, first_calls) = Scripted::new(&[Status::Failure]);
        let (runner, _) = RunFor::new(usize::MAX);
        let mut tree = tree(sequence(vec![
            crate::builder::assign([("calm", true)]),
            crate::builder::composite(
                Strategy::Selector,
                Resume::CursorUnlessChanged,
                vec![leaf(first), leaf(runner)],
            ),
        ]));

        let mut state = State::new();
        for _ in 0..3 {
            assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
            assert_eq!(tree.cursor("0.1"), Some(1));
        }
        // The sibling rewrote `calm = true` every tick without changing it
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);

        // A real change between ticks re-evaluates from the first child
        state.set("calm", false);
        assert_eq!(tree.tick(&mut state).unwrap(), Status::Running);
        assert_eq!(first_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_composite_is_rejected() {
        let err = Tree::new(selector(Vec::new()), TreeConfig::default()).unwrap_err();
        assert!(matches!(err, BuildError::EmptyComposite { kind: "selector", .. }));
    }

    #[test]
    fn recheck_sequence_is_rejected() {
        let root = crate::builder::composite(
            Strategy::Sequence,
            Resume::CursorUnlessChanged,
            vec![leaf(Increment)],
        );
        let err = Tree::new(root, TreeConfig::default()).unwrap_err();
        assert!(matches!(err, BuildError::RecheckOnSequence { .. }));
    }
}
