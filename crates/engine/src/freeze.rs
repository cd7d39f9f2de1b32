//! Serialization of a configured task into replayable UI steps.

use serde_json::Value;
use stagehand_types::{FrozenTaskConfig, StepDescriptor, UiStep};

use crate::{options::is_truthy, task::TaskState};

/// Step kind used unless `ui_options` says otherwise.
pub const DEFAULT_STEP_KIND: &str = "other";

/// Keys always taken from the step and task, never from `ui_options`.
const FROZEN_KEYS: [&str; 5] = ["path", "step_num", "task_class", "task_config", "source"];

/// Freeze the task described by `state` at `step` into a single UI step.
pub fn freeze_task(state: &TaskState, step: &StepDescriptor) -> Vec<UiStep> {
    let task_config = state.task_config();
    let mut ui_step = UiStep {
        name: task_config.name.clone().or_else(|| state.name().map(str::to_string)),
        kind: DEFAULT_STEP_KIND.to_string(),
        is_required: true,
        ui_options: Default::default(),
        path: step.path.clone(),
        step_num: step.step_num.clone(),
        task_class: task_config.class_path.clone(),
        task_config: FrozenTaskConfig {
            options: state.options.clone(),
            checks: task_config.checks.clone(),
        },
        source: step.source.frozen_spec(),
    };

    for (key, value) in &task_config.ui_options {
        match (key.as_str(), value) {
            ("name", Value::Null) => ui_step.name = None,
            ("name", Value::String(name)) => ui_step.name = Some(name.clone()),
            ("name", other) => ui_step.name = Some(other.to_string()),
            ("kind", Value::String(kind)) => ui_step.kind = kind.clone(),
            ("kind", other) => ui_step.kind = other.to_string(),
            ("is_required", required) => ui_step.is_required = is_truthy(required),
            (key, _) if FROZEN_KEYS.contains(&key) => {}
            _ => {
                ui_step.ui_options.insert(key.clone(), value.clone());
            }
        }
    }

    vec![ui_step]
}
