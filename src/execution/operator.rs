//! Operator / remote-control channel: autonomy flag, step confirmation, stop.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

pub trait OperatorChannel: Send + Sync {
    fn autonomous(&self) -> bool;

    fn set_autonomous(&self, autonomous: bool);

    /// Blocks until the operator confirms the next step.
    fn wait_for_next_step(&self);

    fn stop_requested(&self) -> bool;

    fn set_stop(&self, stop: bool);
}

#[derive(Debug, Default)]
struct OperatorState {
    autonomous: bool,
    stop: bool,
    pending_steps: u32,
    auto_advance: bool,
}

/// In-process remote control. `advance` queues one confirmation; a queued
/// confirmation is consumed by the next `wait_for_next_step`.
#[derive(Debug, Default)]
pub struct RemoteControl {
    state: Mutex<OperatorState>,
    stepped: Condvar,
}

impl RemoteControl {
    pub fn new(autonomous: bool) -> Self {
        Self {
            state: Mutex::new(OperatorState {
                autonomous,
                ..OperatorState::default()
            }),
            stepped: Condvar::new(),
        }
    }

    /// Remote that confirms every step immediately (unattended simulation).
    pub fn auto_advancing(autonomous: bool) -> Self {
        let remote = Self::new(autonomous);
        remote.lock().auto_advance = true;
        remote
    }

    fn lock(&self) -> MutexGuard<'_, OperatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Operator presses "next".
    pub fn advance(&self) {
        let mut state = self.lock();
        state.pending_steps = state.pending_steps.saturating_add(1);
        self.stepped.notify_all();
    }

    pub fn pending_steps(&self) -> u32 {
        self.lock().pending_steps
    }
}

impl OperatorChannel for RemoteControl {
    fn autonomous(&self) -> bool {
        self.lock().autonomous
    }

    fn set_autonomous(&self, autonomous: bool) {
        let mut state = self.lock();
        if state.autonomous != autonomous {
            tracing::info!(from = state.autonomous, to = autonomous, "autonomy mode changed");
        }
        state.autonomous = autonomous;
    }

    fn wait_for_next_step(&self) {
        let mut state = self.lock();
        if state.auto_advance {
            return;
        }
        while state.pending_steps == 0 {
            state = self
                .stepped
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.pending_steps -= 1;
    }

    fn stop_requested(&self) -> bool {
        self.lock().stop
    }

    fn set_stop(&self, stop: bool) {
        self.lock().stop = stop;
    }
}
