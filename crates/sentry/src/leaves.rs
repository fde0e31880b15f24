//! Host leaves of the guard tree.
//!
//! Walking and fighting progress lives in the session state, so a tree can be
//! rebuilt or reloaded between ticks without losing the agent's position. The
//! sensor's sweep count stays inside the leaf: it changes every tick and
//! would otherwise make every tick look like a change of the world.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use behavior_tree::{AsyncBehavior, Behavior, LeafError, NodeFactory, State, Status, Value};
use serde::Deserialize;

const ENEMIES: &str = "enemies_num";
const POSITION: &str = "position";
const PROGRESS: &str = "walk_progress";

/// Registers every leaf kind the guard tree refers to.
pub fn register(factory: &mut NodeFactory) {
    factory
        .register_async_leaf("scan", |scan: Scan| scan)
        .register_leaf("attack", |_: Value| Attack)
        .register_leaf("walk", |walk: Walk| walk);
}

fn counter(state: &State, key: &str) -> u64 {
    state.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Sensor sweep. Suspends for the sensor latency, then reports a wave of
/// enemies every `wave_every` sweeps. Writes state only when a wave shows up.
#[derive(Debug, Deserialize)]
pub struct Scan {
    #[serde(default)]
    latency_ms: u64,
    wave_every: u64,
    wave_size: u64,
    #[serde(skip)]
    sweeps: AtomicU64,
}

#[async_trait]
impl AsyncBehavior for Scan {
    async fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;

        let sweep = self.sweeps.fetch_add(1, Ordering::Relaxed) + 1;

        if self.wave_every > 0 && sweep % self.wave_every == 0 {
            let enemies = counter(state, ENEMIES) + self.wave_size;
            state.set(ENEMIES, enemies);
            tracing::info!(sweep, enemies, "enemies sighted");
        }

        Ok(Status::Success)
    }
}

/// Takes one enemy down per tick.
#[derive(Debug)]
pub struct Attack;

impl Behavior for Attack {
    fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        let enemies = counter(state, ENEMIES).saturating_sub(1);
        state.set(ENEMIES, enemies);
        tracing::info!(remaining = enemies, "enemy down");

        Ok(if enemies == 0 {
            Status::Success
        } else {
            Status::Running
        })
    }
}

/// Walks to `waypoint`, taking `ticks` ticks.
#[derive(Debug, Deserialize)]
pub struct Walk {
    waypoint: String,
    ticks: u64,
}

impl Behavior for Walk {
    fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        let progress = counter(state, PROGRESS) + 1;
        if progress < self.ticks {
            state.set(PROGRESS, progress);
            return Ok(Status::Running);
        }

        state.remove(PROGRESS);
        state.set(POSITION, self.waypoint.as_str());
        tracing::debug!(waypoint = %self.waypoint, "waypoint reached");
        Ok(Status::Success)
    }
}
