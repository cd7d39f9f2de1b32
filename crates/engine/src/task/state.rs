use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use indexmap::IndexMap;
use serde_json::Value;
use stagehand_types::{ProjectConfig, TaskConfig, TaskOptions};

use crate::{
    logger::TaskLogger,
    org::OrgConfig,
    output::{OutputCapture, TaskOutput},
    poll::PollState,
    sleep::Sleeper,
    stack::{TaskFrame, TaskId, TaskStack},
};

use super::Flow;

/// Values a task body publishes for its caller.
pub type ReturnValues = IndexMap<String, Value>;

/// Everything a task body can see and mutate while it runs.
#[derive(Debug)]
pub struct TaskState {
    pub(crate) id: TaskId,
    pub(crate) class_name: String,
    pub(crate) project_config: Arc<ProjectConfig>,
    pub(crate) task_config: TaskConfig,
    pub(crate) org_config: Option<Arc<dyn OrgConfig>>,
    pub(crate) flow: Option<Arc<dyn Flow>>,
    pub(crate) name: Option<String>,
    pub(crate) step_num: Option<String>,
    pub(crate) logger: TaskLogger,
    /// Resolved options; bodies may update them (retry counters do).
    pub options: TaskOptions,
    pub return_values: ReturnValues,
    pub poll: PollState,
    pub(crate) result: Option<Value>,
    pub(crate) working_path: Option<PathBuf>,
    pub(crate) debug_mode: bool,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) output: OutputCapture,
    pub(crate) stack: TaskStack,
}

impl TaskState {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn project_config(&self) -> &ProjectConfig {
        &self.project_config
    }

    pub fn task_config(&self) -> &TaskConfig {
        &self.task_config
    }

    pub fn org_config(&self) -> Option<&Arc<dyn OrgConfig>> {
        self.org_config.as_ref()
    }

    pub fn flow(&self) -> Option<&Arc<dyn Flow>> {
        self.flow.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn step_num(&self) -> Option<&str> {
        self.step_num.as_deref()
    }

    pub fn logger(&self) -> &TaskLogger {
        &self.logger
    }

    /// Value returned by the body of the last completed invocation.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Working directory at the moment the task was invoked.
    pub fn working_path(&self) -> Option<&Path> {
        self.working_path.as_deref()
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn stdout(&self) -> TaskOutput {
        self.output.stdout()
    }

    pub fn stderr(&self) -> TaskOutput {
        self.output.stderr()
    }

    /// Wait using the task's sleeper.
    pub fn sleep(&self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    /// Stack the task was last invoked on; nested tasks should be invoked on
    /// the same stack with `call_in`.
    pub fn stack(&self) -> &TaskStack {
        &self.stack
    }

    /// Stack frame describing this task.
    pub fn frame(&self) -> TaskFrame {
        TaskFrame {
            task_id: self.id,
            class_name: self.class_name.clone(),
            name: self.name.clone(),
            step_num: self.step_num.clone(),
            logger: self.logger.name().to_string(),
        }
    }
}
