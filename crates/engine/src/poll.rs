//! Generic poll loop with a stepped back-off.
//!
//! Each iteration runs the poll action, stops once the action marks the state
//! complete, and otherwise sleeps. Every third iteration the interval grows by
//! one second, so waits go 1s x3, 2s x3, 3s x3 and so on. There is no iteration
//! cap; the action is responsible for completing or failing.

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::task::{Task, TaskState};

const INITIAL_INTERVAL_SECS: u64 = 1;

/// Poll progress of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollState {
    pub complete: bool,
    pub count: u32,
    pub interval_level: u32,
    pub interval_s: u64,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            complete: false,
            count: 0,
            interval_level: 0,
            interval_s: INITIAL_INTERVAL_SECS,
        }
    }
}

impl PollState {
    /// Restore the initial values so another remote job can be polled.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_s)
    }

    /// Step the interval up when the count crosses the next multiple of three.
    ///
    /// Returns the new interval in seconds when it changed.
    pub fn update_interval(&mut self) -> Option<u64> {
        if self.count / 3 > self.interval_level {
            self.interval_level += 1;
            self.interval_s += 1;
            return Some(self.interval_s);
        }
        None
    }
}

/// Poll using the variant's [`Task::poll_action`].
pub fn poll<T: Task + ?Sized>(task: &mut T, state: &mut TaskState) -> Result<()> {
    poll_with(state, |state| task.poll_action(state))
}

/// Poll with an ad-hoc action until it marks `state.poll` complete.
pub fn poll_with<F>(state: &mut TaskState, mut action: F) -> Result<()>
where
    F: FnMut(&mut TaskState) -> Result<()>,
{
    loop {
        state.poll.count += 1;
        if let Err(error) = action(state) {
            state.logger.warning(format!("Poll action failed: {error:#}"));
            return Err(error);
        }
        if state.poll.complete {
            debug!(task = %state.class_name, attempts = state.poll.count, "poll complete");
            return Ok(());
        }
        state.sleep(state.poll.interval());
        if let Some(interval) = state.poll.update_interval() {
            state.logger.info(format!("Increased polling interval to {interval} seconds"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_steps_up_every_third_poll() {
        let mut state = PollState::default();
        let mut intervals = Vec::new();
        for _ in 0..9 {
            state.count += 1;
            intervals.push(state.interval_s);
            state.update_interval();
        }

        assert_eq!(intervals, vec![1, 1, 1, 2, 2, 2, 3, 3, 3]);
        assert_eq!(state.interval_level, 3);
    }

    #[test]
    fn reset_restores_initial_values() {
        let mut state = PollState {
            complete: true,
            count: 7,
            interval_level: 2,
            interval_s: 3,
        };
        state.reset();

        assert_eq!(state, PollState::default());
        assert_eq!(state.interval(), Duration::from_secs(1));
    }
}
