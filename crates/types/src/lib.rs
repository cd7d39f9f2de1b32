//! Shared type definitions for the Stagehand task engine.
//!
//! - [`project`]: project configuration and its source
//! - [`task`]: task configuration, option schemas, and frozen UI steps
//! - [`service`]: named service credentials and the [`Keychain`] interface

pub mod project;
pub mod service;
pub mod task;

pub use project::{ProjectConfig, ProjectSource, RepoInfo};
pub use service::{Keychain, ServiceConfig, ServiceError};
pub use task::{FrozenTaskConfig, OptionSchema, OptionSpec, StepDescriptor, TaskConfig, TaskOptions, UiStep};
