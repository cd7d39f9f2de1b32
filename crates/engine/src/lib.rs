//! # Stagehand Engine
//!
//! The Stagehand Engine runs automation tasks against a project: it resolves
//! and validates task options, drives a task through its lifecycle, and offers
//! the retry and poll loops task bodies build on.
//!
//! ## Key Features
//!
//! - **Option Templating**: `$project_config.<attribute>` references in option values
//! - **Option Validation**: declarative option schemas with required names and defaults
//! - **Task Lifecycle**: org preconditions, credential refresh, scoped working directory
//!   and output capture around the task body
//! - **Retry / Poll**: option-driven retry budgets and a stepped poll back-off
//! - **Freezing**: configured tasks serialized into replayable UI steps
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::{Value, json};
//! use stagehand_engine::{Task, TaskInstance, TaskState, init_tracing, parse_project_file};
//!
//! #[derive(Debug)]
//! struct Greet;
//!
//! impl Task for Greet {
//!     fn run_task(&mut self, state: &mut TaskState) -> anyhow::Result<Value> {
//!         let greeting = format!("hello from {}", state.options["repo"].as_str().unwrap_or_default());
//!         state.return_values.insert("greeting".into(), json!(greeting));
//!         Ok(Value::Null)
//!     }
//! }
//!
//! init_tracing();
//! let temp_dir = tempfile::tempdir()?;
//! let project_path = temp_dir.path().join("stagehand.yml");
//! std::fs::write(&project_path, r#"
//! repo:
//!   name: "release-tools"
//! tasks:
//!   greet:
//!     class_path: "tasks.Greet"
//!     options:
//!       repo: "$project_config.repo_name"
//! "#)?;
//!
//! let project = Arc::new(parse_project_file(&project_path)?);
//! let task_config = project.task_config("greet").expect("declared task");
//! let mut task = TaskInstance::builder(Greet, project, task_config).build()?;
//! let returned = task.call()?;
//! assert_eq!(returned["greeting"], "hello from release-tools");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`templates`**: project attribute lookup and option templating
//! - **`options`**: option merging, validation, and typed access
//! - **`task`**: the `Task` trait, task state, and the lifecycle driver
//! - **`retry`** / **`poll`**: loops task bodies opt into
//! - **`stack`**: frames of the tasks currently executing on a thread
//! - **`freeze`**: UI step serialization

use std::{fs, path::Path};

use anyhow::{Context, Result};
use stagehand_types::{ProjectConfig, ProjectSource};
use stagehand_util::{keychain_from_environment, resolve_against};
use tracing::debug;

pub mod error;
pub mod freeze;
pub mod logger;
pub mod options;
pub mod org;
pub mod output;
pub mod poll;
pub mod retry;
pub mod settings;
pub mod sleep;
pub mod stack;
pub mod task;
pub mod templates;
pub mod workdir;

// Re-export commonly used types for convenience
pub use error::TaskError;
pub use freeze::freeze_task;
pub use logger::{LogLevel, LogLine, TaskLogger};
pub use org::{OrgConfig, client_name, refresh_org_credentials, save_if_changed};
pub use output::{OutputCapture, OutputScope, OutputStream, TaskOutput};
pub use poll::{PollState, poll, poll_with};
pub use retry::{Retryability, RetrySettings, StepFailure, retry, retry_with};
pub use settings::EngineSettings;
pub use sleep::{Sleeper, ThreadSleeper};
pub use stack::{StackGuard, TaskFrame, TaskId, TaskStack};
pub use task::{Flow, ReturnValues, Task, TaskBuilder, TaskInstance, TaskState};
pub use templates::{ProjectLookup, resolve_option_templates};
pub use workdir::WorkingDirGuard;

pub use stagehand_util::init_tracing;

/// Loads a project file (YAML or JSON) into a [`ProjectConfig`].
///
/// A relative or `~` `repo_root` is resolved against the file's directory, which
/// is also the default when the document declares none. A local source without
/// a path records that directory. The keychain is the backend selected by
/// `STAGEHAND_SECRETS_BACKEND`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe a project.
pub fn parse_project_file(file_path: impl AsRef<Path>) -> Result<ProjectConfig> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read project file: {}", file_path.display()))?;
    let mut project: ProjectConfig =
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse project file: {}", file_path.display()))?;

    let file_path = file_path
        .canonicalize()
        .with_context(|| format!("Failed to resolve project file: {}", file_path.display()))?;
    let project_dir = file_path.parent().unwrap_or_else(|| Path::new("/")).to_path_buf();

    project.repo_root = Some(match project.repo_root.take() {
        Some(configured) => resolve_against(&project_dir, &configured.to_string_lossy()),
        None => project_dir.clone(),
    });
    if let ProjectSource::Local { path } = &mut project.source
        && path.is_none()
    {
        *path = Some(project_dir);
    }

    debug!(path = %file_path.display(), tasks = project.tasks.len(), "project file loaded");
    Ok(project.with_keychain(keychain_from_environment()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tasks_and_defaults_repo_root_to_the_file_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_path = temp_dir.path().join("stagehand.yml");
        fs::write(
            &project_path,
            r#"
repo:
  name: "release-tools"
  owner: "acme"
project:
  package:
    name: "rt"
tasks:
  deploy:
    class_path: "tasks.salesforce.Deploy"
    options:
      path: "src"
"#,
        )
        .unwrap();

        let project = parse_project_file(&project_path).expect("project parses");
        let root = temp_dir.path().canonicalize().unwrap();

        assert_eq!(project.repo_root(), Some(root.as_path()));
        assert_eq!(project.repo.owner.as_deref(), Some("acme"));
        assert_eq!(project.source, ProjectSource::Local { path: Some(root) });
        let deploy = project.task_config("deploy").expect("deploy task");
        assert_eq!(deploy.name.as_deref(), Some("deploy"));
        assert_eq!(deploy.options.unwrap()["path"], "src");
    }

    #[test]
    fn relative_repo_root_resolves_against_the_file_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_path = temp_dir.path().join("stagehand.json");
        fs::write(&project_path, r#"{"repo_root": "checkout", "tasks": {}}"#).unwrap();

        let project = parse_project_file(&project_path).unwrap();

        assert_eq!(
            project.repo_root(),
            Some(temp_dir.path().canonicalize().unwrap().join("checkout").as_path())
        );
    }

    #[test]
    fn loaded_projects_resolve_services_from_the_selected_backend() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_path = temp_dir.path().join("stagehand.yml");
        fs::write(&project_path, "repo:\n  name: \"release-tools\"\n").unwrap();

        temp_env::with_vars(
            [
                ("STAGEHAND_SECRETS_BACKEND", Some("env")),
                ("STAGEHAND_SERVICE_CONNECTEDAPP", Some(r#"{"client_id": "3MVG9loaded"}"#)),
            ],
            || {
                let project = parse_project_file(&project_path).unwrap();
                assert_eq!(client_name(&project), "3MVG9loaded");
            },
        );
    }

    #[test]
    fn unreadable_files_report_the_path() {
        let error = parse_project_file("/definitely/not/here.yml").unwrap_err();
        assert!(error.to_string().contains("/definitely/not/here.yml"));
    }
}
