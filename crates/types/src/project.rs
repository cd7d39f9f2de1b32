//! Project-level configuration shared by every task in a run.
//!
//! A [`ProjectConfig`] describes the repository being acted upon: where it lives
//! on disk, its source-control coordinates, named task configurations, and the
//! raw project document that option templates may reference.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{service::Keychain, task::TaskConfig};

/// Source-control coordinates of the project repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
}

/// Where the project definition was loaded from.
///
/// The frozen form is recorded on every UI step so a replay can fetch the exact
/// same project revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectSource {
    /// A project checked out on the local filesystem.
    Local {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// A project fetched from a GitHub repository at a pinned commit.
    #[serde(rename = "github")]
    GitHub {
        url: String,
        commit: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl Default for ProjectSource {
    fn default() -> Self {
        Self::Local { path: None }
    }
}

impl ProjectSource {
    /// Declarative, replayable description of this source.
    pub fn frozen_spec(&self) -> Value {
        match self {
            ProjectSource::Local { path } => json!({
                "path": path.as_ref().map(|path| path.display().to_string()),
            }),
            ProjectSource::GitHub { url, commit, description } => json!({
                "github": url,
                "commit": commit,
                "description": description.clone().unwrap_or_else(|| commit.clone()),
            }),
        }
    }
}

/// Configuration of the project a task runs against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Repository root; tasks execute with this as their working directory.
    #[serde(default)]
    pub repo_root: Option<PathBuf>,
    #[serde(default)]
    pub repo: RepoInfo,
    /// The `project:` section of the project document.
    #[serde(default)]
    pub project: IndexMap<String, Value>,
    /// Named task configurations declared by the project.
    #[serde(default)]
    pub tasks: IndexMap<String, TaskConfig>,
    #[serde(default)]
    pub source: ProjectSource,
    /// Any other top-level sections of the project document.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    #[serde(skip)]
    keychain: Option<Arc<dyn Keychain>>,
}

impl ProjectConfig {
    pub fn with_repo_root(mut self, repo_root: impl Into<PathBuf>) -> Self {
        self.repo_root = Some(repo_root.into());
        self
    }

    pub fn with_repo(mut self, repo: RepoInfo) -> Self {
        self.repo = repo;
        self
    }

    pub fn with_keychain(mut self, keychain: Arc<dyn Keychain>) -> Self {
        self.keychain = Some(keychain);
        self
    }

    pub fn repo_root(&self) -> Option<&Path> {
        self.repo_root.as_deref()
    }

    pub fn keychain(&self) -> Option<&dyn Keychain> {
        self.keychain.as_deref()
    }

    /// Returns the named task configuration, with its name filled in when the
    /// document left it implicit.
    pub fn task_config(&self, name: &str) -> Option<TaskConfig> {
        self.tasks.get(name).map(|config| {
            let mut config = config.clone();
            if config.name.is_none() {
                config.name = Some(name.to_string());
            }
            config
        })
    }

    /// The project document as a JSON tree, keyed by top-level section.
    pub fn document(&self) -> Value {
        let mut document = serde_json::Map::new();
        for (key, value) in &self.extra {
            document.insert(key.clone(), value.clone());
        }
        document.insert("project".into(), json!(self.project));
        document.insert("tasks".into(), serde_json::to_value(&self.tasks).unwrap_or(Value::Null));
        Value::Object(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT_YAML: &str = r#"
repo:
  name: "release-tools"
  owner: "acme"
project:
  name: "Release Tools"
  package:
    name: "rt"
    api_version: "59.0"
tasks:
  deploy:
    class_path: "tasks.Deploy"
    options:
      path: "src"
sources:
  shared: "github.com/acme/shared"
"#;

    #[test]
    fn project_config_parses_sections_and_keeps_unknown_ones() {
        let config: ProjectConfig = serde_yaml::from_str(PROJECT_YAML).expect("project config");

        assert_eq!(config.repo.name.as_deref(), Some("release-tools"));
        assert_eq!(config.project["package"]["name"], "rt");
        assert!(config.extra.contains_key("sources"));
        assert_eq!(config.source, ProjectSource::Local { path: None });
    }

    #[test]
    fn task_config_fills_in_name_from_key() {
        let config: ProjectConfig = serde_yaml::from_str(PROJECT_YAML).expect("project config");
        let task = config.task_config("deploy").expect("deploy task");

        assert_eq!(task.name.as_deref(), Some("deploy"));
        assert_eq!(task.class_path.as_deref(), Some("tasks.Deploy"));
        assert!(config.task_config("missing").is_none());
    }

    #[test]
    fn document_exposes_project_and_extra_sections() {
        let config: ProjectConfig = serde_yaml::from_str(PROJECT_YAML).expect("project config");
        let document = config.document();

        assert_eq!(document["project"]["package"]["api_version"], "59.0");
        assert_eq!(document["sources"]["shared"], "github.com/acme/shared");
        assert_eq!(document["tasks"]["deploy"]["options"]["path"], "src");
    }

    #[test]
    fn github_source_freezes_with_commit_as_default_description() {
        let source = ProjectSource::GitHub {
            url: "https://github.com/acme/release-tools".into(),
            commit: "abc123".into(),
            description: None,
        };

        assert_eq!(
            source.frozen_spec(),
            json!({
                "github": "https://github.com/acme/release-tools",
                "commit": "abc123",
                "description": "abc123",
            })
        );
    }
}
