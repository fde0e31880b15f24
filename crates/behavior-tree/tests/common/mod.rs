//! Leaf fixtures shared by the integration tests.
#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use behavior_tree::{AsyncBehavior, Behavior, LeafError, State, Status};
use tokio::sync::watch;

pub type Calls = Arc<AtomicUsize>;

pub fn calls(counter: &Calls) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Returns the scripted statuses in order, repeating the last one.
pub struct Script {
    statuses: Vec<Status>,
    calls: Calls,
}

impl Script {
    pub fn new(statuses: &[Status]) -> (Self, Calls) {
        let calls = Calls::default();
        let script = Self {
            statuses: statuses.to_vec(),
            calls: Arc::clone(&calls),
        };
        (script, calls)
    }

    fn next(&self) -> Status {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .get(call)
            .or(self.statuses.last())
            .copied()
            .unwrap_or(Status::Success)
    }
}

impl Behavior for Script {
    fn tick(&self, _state: &mut State) -> Result<Status, LeafError> {
        Ok(self.next())
    }
}

/// Runs for `ticks` ticks, tracking progress in a state variable.
pub struct Countdown {
    key: &'static str,
    ticks: u64,
}

impl Countdown {
    pub fn new(key: &'static str, ticks: u64) -> Self {
        Self { key, ticks }
    }

    fn step(&self, state: &mut State) -> Status {
        let remaining = state
            .get(self.key)
            .and_then(|v| v.as_u64())
            .unwrap_or(self.ticks);
        if remaining == 0 {
            state.remove(self.key);
            Status::Success
        } else {
            state.set(self.key, remaining - 1);
            Status::Running
        }
    }
}

impl Behavior for Countdown {
    fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        Ok(self.step(state))
    }
}

/// [`Countdown`] that yields to the scheduler before doing its work.
pub struct AsyncCountdown(pub Countdown);

#[async_trait]
impl AsyncBehavior for AsyncCountdown {
    async fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        tokio::task::yield_now().await;
        Ok(self.0.step(state))
    }
}

/// Suspends until the gate is opened, then records `label` and succeeds.
pub struct Gate {
    label: &'static str,
    open: watch::Receiver<bool>,
    passed: Arc<std::sync::Mutex<Vec<&'static str>>>,
    calls: Calls,
}

pub struct GateHandle {
    pub open: watch::Sender<bool>,
    pub passed: Arc<std::sync::Mutex<Vec<&'static str>>>,
    pub calls: Calls,
}

impl Gate {
    pub fn new(label: &'static str) -> (Self, GateHandle) {
        Self::with_log(label, Arc::default())
    }

    pub fn with_log(
        label: &'static str,
        passed: Arc<std::sync::Mutex<Vec<&'static str>>>,
    ) -> (Self, GateHandle) {
        let (tx, rx) = watch::channel(false);
        let calls = Calls::default();
        let gate = Self {
            label,
            open: rx,
            passed: Arc::clone(&passed),
            calls: Arc::clone(&calls),
        };
        (
            gate,
            GateHandle {
                open: tx,
                passed,
                calls,
            },
        )
    }
}

#[async_trait]
impl AsyncBehavior for Gate {
    async fn tick(&self, state: &mut State) -> Result<Status, LeafError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.clone();
        open.wait_for(|open| *open).await.map(|_| ())?;
        self.passed.lock().unwrap().push(self.label);
        state.set(self.label, true);
        Ok(Status::Success)
    }
}

/// Fails with an I/O error on the first `failures` calls, then succeeds.
pub struct Flaky {
    failures: usize,
    calls: Calls,
}

impl Flaky {
    pub fn new(failures: usize) -> (Self, Calls) {
        let calls = Calls::default();
        (
            Self {
                failures,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl Behavior for Flaky {
    fn tick(&self, _state: &mut State) -> Result<Status, LeafError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(Box::new(io::Error::new(io::ErrorKind::ConnectionReset, "sensor offline")))
        } else {
            Ok(Status::Success)
        }
    }
}
