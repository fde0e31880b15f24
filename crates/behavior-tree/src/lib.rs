//! Behavior tree engine with persistent controllers and a suspending tick path.
//!
//! A tree of composable nodes is repeatedly ticked against a shared [`State`]
//! to decide what an agent should do next. Every tick returns a [`Status`];
//! the host decides what `Running`, `Success` and `Failure` at the root mean.
//!
//! - **Deterministic order**: children are visited left to right, depth first,
//!   one at a time, on both tick paths
//! - **Persistent controllers**: a composite with a cursor resumes at the child
//!   that returned `Running` instead of restarting from the top
//! - **Two execution paths**: [`Tree::tick`] for leaves that complete within
//!   the call, [`Tree::tick_async`] for leaves that await external input
//! - **Commit on return**: cursors are written only when a controller returns,
//!   so an abandoned or failed tick can safely be retried
//!
//! # Architecture
//!
//! - [`Node`]: identity plus one variant of the closed [`NodeKind`] set
//! - [`Composite`]: [`Strategy`] (selector or sequence) with a [`Resume`] policy
//! - Task nodes: [`Evaluate`], [`Assign`], [`Reset`], [`Clear`]
//! - Host leaves: [`Behavior`], [`AsyncBehavior`]
//! - [`Tree`] / [`Driver`]: preparation and tick entry points
//! - [`NodeFactory`]: construction from [`NodeConfig`] records

pub mod behavior;
pub mod builder;
pub mod composite;
pub mod config;
pub mod error;
pub mod factory;
pub mod node;
pub mod state;
pub mod status;
pub mod task;
pub mod tree;

// Re-export core types for ergonomic API
pub use behavior::{AsyncBehavior, Behavior};
pub use composite::{Composite, Cursor, Mark, Resume, Strategy};
pub use config::TreeConfig;
pub use error::{BuildError, LeafError, Result, TickError};
pub use factory::{NodeConfig, NodeFactory, NodeKindConfig};
pub use node::{Node, NodeId, NodeKind};
pub use state::{State, Value};
pub use status::Status;
pub use task::{Assign, Clear, Comparator, Condition, Evaluate, OnMissing, Reset, Source};
pub use tree::{Driver, Tree};
