//! Built-in task (leaf) nodes.
//!
//! - `evaluate`: compares state variables and reports Success/Failure
//! - `assign`: writes state variables
//! - `reset`: restarts a persistent controller from its first child
//! - `clear`: uninitialises state variables

pub mod assign;
pub mod clear;
pub mod evaluate;
pub mod reset;

pub use assign::{Assign, Source};
pub use clear::Clear;
pub use evaluate::{Comparator, Condition, Evaluate, OnMissing};
pub use reset::Reset;
