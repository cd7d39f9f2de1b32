//! Generic retry loop driven by task options.
//!
//! The loop reads three numeric options:
//!
//! - `retries`: attempts left after the first failure
//! - `retry_interval`: seconds to wait before the next attempt
//! - `retry_interval_add`: seconds added to the interval after each wait
//!
//! Missing options count as zero. Updated counters are written back into the
//! task's options so the body (and a later freeze) observe the remaining budget.

use std::{fmt, time::Duration};

use anyhow::{Error, Result, bail};
use stagehand_types::TaskOptions;
use tracing::debug;

use crate::{
    options::{number_value, option_number},
    task::{Task, TaskState},
};

pub const RETRIES: &str = "retries";
pub const RETRY_INTERVAL: &str = "retry_interval";
pub const RETRY_INTERVAL_ADD: &str = "retry_interval_add";

/// Whether a failed attempt may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    Transient,
    Permanent,
}

/// Outcome of a failed attempt.
#[derive(Debug)]
pub struct StepFailure {
    retryability: Retryability,
    error: Error,
}

impl StepFailure {
    pub fn transient(error: impl Into<Error>) -> Self {
        Self {
            retryability: Retryability::Transient,
            error: error.into(),
        }
    }

    pub fn permanent(error: impl Into<Error>) -> Self {
        Self {
            retryability: Retryability::Permanent,
            error: error.into(),
        }
    }

    pub fn retryability(&self) -> Retryability {
        self.retryability
    }

    pub fn is_transient(&self) -> bool {
        self.retryability == Retryability::Transient
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_error(self) -> Error {
        self.error
    }

    pub fn into_permanent(self) -> Self {
        Self {
            retryability: Retryability::Permanent,
            ..self
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

/// Errors raised with `?` inside an attempt are transient.
impl From<Error> for StepFailure {
    fn from(error: Error) -> Self {
        Self::transient(error)
    }
}

/// Retry budget read from task options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RetrySettings {
    pub retries: f64,
    pub retry_interval: f64,
    pub retry_interval_add: f64,
}

impl RetrySettings {
    pub fn from_options(options: &TaskOptions) -> Result<Self> {
        Ok(Self {
            retries: option_number(options, RETRIES)?.unwrap_or(0.0),
            retry_interval: option_number(options, RETRY_INTERVAL)?.unwrap_or(0.0),
            retry_interval_add: option_number(options, RETRY_INTERVAL_ADD)?.unwrap_or(0.0),
        })
    }
}

/// Retry the variant's [`Task::try_step`].
///
/// Transient failures the variant rejects through [`Task::is_retry_valid`]
/// are treated as permanent.
pub fn retry<T: Task + ?Sized>(task: &mut T, state: &mut TaskState) -> Result<()> {
    retry_with(state, |state| match task.try_step(state) {
        Err(failure) if failure.is_transient() && !task.is_retry_valid(failure.error()) => {
            Err(failure.into_permanent())
        }
        outcome => outcome,
    })
}

/// Run `attempt` until it succeeds, fails permanently, or the budget runs out.
///
/// The budget is read from the options after every failure, so an attempt may
/// adjust `retries` or the intervals for the rest of the loop.
pub fn retry_with<T, F>(state: &mut TaskState, mut attempt: F) -> Result<T>
where
    F: FnMut(&mut TaskState) -> Result<T, StepFailure>,
{
    loop {
        let failure = match attempt(state) {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };
        state.logger.warning(format!("{failure}"));
        let mut settings = RetrySettings::from_options(&state.options)?;
        if settings.retries <= 0.0 || !failure.is_transient() {
            debug!(
                task = %state.class_name,
                retryability = ?failure.retryability(),
                "retry budget exhausted or failure is permanent"
            );
            return Err(failure.into_error());
        }

        if settings.retry_interval > 0.0 {
            let Ok(wait) = Duration::try_from_secs_f64(settings.retry_interval) else {
                bail!("option '{RETRY_INTERVAL}' is out of range: {}", settings.retry_interval);
            };
            state.logger.warning(format!(
                "Sleeping for {} seconds before retry...",
                number_value(settings.retry_interval)
            ));
            state.sleep(wait);
            if settings.retry_interval_add > 0.0 {
                settings.retry_interval += settings.retry_interval_add;
                if !settings.retry_interval.is_finite() {
                    bail!("option '{RETRY_INTERVAL}' is out of range after adding '{RETRY_INTERVAL_ADD}'");
                }
                state
                    .options
                    .insert(RETRY_INTERVAL.to_string(), number_value(settings.retry_interval));
            }
        }

        settings.retries -= 1.0;
        state.options.insert(RETRIES.to_string(), number_value(settings.retries));
        state.logger.warning(format!(
            "Retrying ({} attempts remaining)",
            number_value(settings.retries)
        ));
    }
}
