//! Host leaf traits.
//!
//! Built-in task nodes cover evaluation, assignment and persistence reset.
//! Everything that talks to the outside world is supplied by the host as a
//! leaf implementing [`Behavior`] (completes within the call) or
//! [`AsyncBehavior`] (may suspend while awaiting external input).

use async_trait::async_trait;

use crate::error::LeafError;
use crate::state::State;
use crate::Status;

/// A leaf node that completes synchronously.
///
/// Synchronous leaves run on both the blocking and the suspending tick path.
pub trait Behavior: Send + Sync {
    /// Evaluate this leaf against the session state.
    ///
    /// # Arguments
    ///
    /// * `state` - Session variables. The leaf may read and write any of them
    ///   but must not keep the reference past the call.
    ///
    /// # Returns
    ///
    /// - `Ok(Status)` with the outcome of this tick
    /// - `Err(_)` if an external interaction failed; the error aborts the tick
    fn tick(&self, state: &mut State) -> Result<Status, LeafError>;
}

/// Blanket implementation for boxed behaviors.
///
/// This allows `Box<dyn Behavior>` to also implement `Behavior`, so already
/// boxed leaves can be handed to the builders unchanged.
impl Behavior for Box<dyn Behavior> {
    #[inline]
    fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        (**self).tick(state)
    }
}

/// A leaf node whose work is a suspension point.
///
/// Trees containing at least one `AsyncBehavior` can only be ticked through
/// [`Tree::tick_async`](crate::Tree::tick_async).
#[async_trait]
pub trait AsyncBehavior: Send + Sync {
    /// Evaluate this leaf, awaiting external input as needed.
    ///
    /// Dropping the returned future abandons the tick; any state writes the
    /// leaf already made stay applied.
    async fn tick(&self, state: &mut State) -> Result<Status, LeafError>;
}

#[async_trait]
impl AsyncBehavior for Box<dyn AsyncBehavior> {
    #[inline]
    async fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        (**self).tick(state).await
    }
}
