//! Task variants and their lifecycle.
//!
//! A task variant implements [`Task`]: the required body ([`Task::run_task`])
//! plus optional hooks with sensible defaults. A [`TaskInstance`] pairs the
//! variant with its [`TaskState`] and drives construction and invocation:
//!
//! - construction resolves the logger, merges and templates options, and
//!   validates them against the variant's [`OptionSchema`]
//! - invocation checks the org precondition, refreshes credentials, runs the
//!   init hook, then executes the body inside a task frame, the project's
//!   working directory, and an output capture scope
//!
//! Retry and poll loops are opt-in helpers ([`crate::retry`], [`crate::poll`])
//! that a body calls with its own state.

use std::{any, fmt};

use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use stagehand_types::OptionSchema;

use crate::{logger::TaskLogger, org::refresh_org_credentials, retry::StepFailure};

mod instance;
mod state;

pub use instance::{TaskBuilder, TaskInstance};
pub use state::{ReturnValues, TaskState};

/// Parent flow a task runs inside of.
pub trait Flow: fmt::Debug {
    fn name(&self) -> &str;

    /// Logger under which member tasks create their own child loggers.
    fn logger(&self) -> &TaskLogger;
}

/// Behavior of one task variant.
pub trait Task {
    /// Short name used in logs and error messages.
    fn class_name(&self) -> String {
        short_type_name(any::type_name::<Self>())
    }

    fn task_docs(&self) -> &str {
        ""
    }

    /// Options this variant understands.
    fn task_options(&self) -> OptionSchema {
        OptionSchema::new()
    }

    /// Whether invocation needs an attached org session.
    fn requires_org(&self) -> bool {
        false
    }

    /// Refresh credentials before the body runs.
    ///
    /// Org-bound variants refresh the OAuth token and persist the org when the
    /// refresh changed it.
    fn update_credentials(&mut self, state: &mut TaskState) -> Result<()> {
        if !self.requires_org() {
            return Ok(());
        }
        match state.org_config() {
            Some(org) => refresh_org_credentials(org.as_ref(), state.project_config(), state.logger()),
            None => Ok(()),
        }
    }

    fn init_task(&mut self, _state: &mut TaskState) -> Result<()> {
        Ok(())
    }

    /// The task body. Its value is stored as the task result.
    fn run_task(&mut self, state: &mut TaskState) -> Result<Value>;

    /// One attempt of the retryable step driven by [`crate::retry::retry`].
    fn try_step(&mut self, _state: &mut TaskState) -> Result<(), StepFailure> {
        Err(StepFailure::permanent(anyhow!(
            "{} does not define a retryable step",
            self.class_name()
        )))
    }

    /// Whether a transient failure may be retried.
    fn is_retry_valid(&self, _error: &anyhow::Error) -> bool {
        true
    }

    /// One poll iteration driven by [`crate::poll::poll`]. Sets
    /// `state.poll.complete` once the awaited work is done.
    fn poll_action(&mut self, _state: &mut TaskState) -> Result<()> {
        bail!("{} does not define a poll action", self.class_name())
    }
}

/// `crate::module::Name<Generic>` becomes `Name`.
fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_type_names_drop_paths_and_generics() {
        assert_eq!(short_type_name("stagehand_engine::tasks::CreateRelease"), "CreateRelease");
        assert_eq!(short_type_name("crate::Wrapper<crate::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
