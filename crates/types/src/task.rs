//! Task configuration, option schemas, and the frozen UI step record.
//!
//! These types sit on the boundary between authored configuration (project
//! documents, flow steps) and the engine that runs tasks. They preserve
//! authoring order via `IndexMap` so UIs can render options predictably.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::project::ProjectSource;

/// Ordered option mapping owned by a task instance.
pub type TaskOptions = IndexMap<String, Value>;

/// Authored configuration for a single task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskConfig {
    /// Name of the task as declared in the project or flow.
    #[serde(default)]
    pub name: Option<String>,
    /// Fully-qualified reference to the task implementation.
    #[serde(default)]
    pub class_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Option values supplied by configuration.
    #[serde(default)]
    pub options: Option<TaskOptions>,
    /// Declarative preflight checks recorded alongside the options when frozen.
    #[serde(default)]
    pub checks: Vec<Value>,
    /// Overrides applied to the frozen UI step (`name`, `kind`, `is_required`, ...).
    #[serde(default)]
    pub ui_options: IndexMap<String, Value>,
}

impl TaskConfig {
    pub fn new(class_path: impl Into<String>) -> Self {
        Self {
            class_path: Some(class_path.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.get_or_insert_with(IndexMap::new).insert(key.into(), value.into());
        self
    }

    pub fn with_ui_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ui_options.insert(key.into(), value.into());
        self
    }

    pub fn with_check(mut self, check: Value) -> Self {
        self.checks.push(check);
        self
    }
}

/// Declarative description of a single task option.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptionSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Value used when the option is optional and was not supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Option schema declared by a task type, in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct OptionSchema {
    options: IndexMap<String, OptionSpec>,
}

impl OptionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.options.insert(
            name.into(),
            OptionSpec {
                description: Some(description.into()),
                required: true,
                default: None,
            },
        );
        self
    }

    pub fn optional(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.options.insert(
            name.into(),
            OptionSpec {
                description: Some(description.into()),
                required: false,
                default: None,
            },
        );
        self
    }

    /// Declare an optional option that falls back to `default` when absent.
    pub fn with_default(mut self, name: impl Into<String>, description: impl Into<String>, default: impl Into<Value>) -> Self {
        self.options.insert(
            name.into(),
            OptionSpec {
                description: Some(description.into()),
                required: false,
                default: Some(default.into()),
            },
        );
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionSpec)> {
        self.options.iter()
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.get(name)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Step placement supplied by the orchestrating flow when freezing a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepDescriptor {
    /// Dotted path of the step within the flow, e.g. `deploy_pre.force_deploy`.
    pub path: String,
    /// Step number rendered as text, e.g. `1` or `2/1`.
    pub step_num: String,
    /// Source of the project that declared the step.
    #[serde(default)]
    pub source: ProjectSource,
}

impl StepDescriptor {
    pub fn new(path: impl Into<String>, step_num: impl ToString, source: ProjectSource) -> Self {
        Self {
            path: path.into(),
            step_num: step_num.to_string(),
            source,
        }
    }
}

/// Options and checks of a frozen task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrozenTaskConfig {
    pub options: TaskOptions,
    pub checks: Vec<Value>,
}

/// Declarative, replayable record of one configured task.
///
/// Field names are stable: UIs and replay tooling persist these records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiStep {
    pub name: Option<String>,
    pub kind: String,
    pub is_required: bool,
    /// Any further UI option overrides carried through from the task config.
    #[serde(flatten)]
    pub ui_options: IndexMap<String, Value>,
    pub path: String,
    pub step_num: String,
    pub task_class: Option<String>,
    pub task_config: FrozenTaskConfig,
    pub source: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_config_parses_optional_sections() {
        let config: TaskConfig = serde_yaml::from_str(
            r#"
class_path: "tasks.Deploy"
options:
  path: "src"
  unmanaged: true
ui_options:
  kind: "metadata"
"#,
        )
        .expect("task config");

        let options = config.options.expect("options");
        assert_eq!(options.keys().collect::<Vec<_>>(), vec!["path", "unmanaged"]);
        assert_eq!(config.ui_options["kind"], "metadata");
        assert!(config.checks.is_empty());
        assert!(config.name.is_none());
    }

    #[test]
    fn option_schema_preserves_declaration_order() {
        let schema = OptionSchema::new()
            .required("tag", "Release tag")
            .optional("notes", "Release notes")
            .with_default("draft", "Create as draft", false);

        let names: Vec<_> = schema.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["tag", "notes", "draft"]);
        assert!(schema.get("tag").expect("tag").required);
        assert_eq!(schema.get("draft").and_then(|spec| spec.default.clone()), Some(json!(false)));
    }

    #[test]
    fn ui_step_flattens_extra_ui_options() {
        let step = UiStep {
            name: Some("deploy".into()),
            kind: "metadata".into(),
            is_required: false,
            ui_options: IndexMap::from([("description".to_string(), json!("Deploys metadata"))]),
            path: "deploy".into(),
            step_num: "1".into(),
            task_class: Some("tasks.Deploy".into()),
            task_config: FrozenTaskConfig::default(),
            source: json!({"path": null}),
        };

        let serialized = serde_json::to_value(&step).expect("serialize");
        assert_eq!(serialized["description"], "Deploys metadata");
        assert_eq!(serialized["kind"], "metadata");
        assert_eq!(serialized["task_config"], json!({"options": {}, "checks": []}));
    }
}
