use std::sync::Arc;

use serde_json::Value;
use stagehand_types::{ProjectConfig, StepDescriptor, TaskConfig, TaskOptions, UiStep};
use stagehand_util::redact_options;
use tracing::debug;

use crate::{
    error::TaskError,
    freeze::freeze_task,
    logger::TaskLogger,
    options::{apply_schema_defaults, merge_options, validate_options},
    org::OrgConfig,
    output::OutputCapture,
    poll::PollState,
    settings::EngineSettings,
    sleep::{Sleeper, ThreadSleeper},
    stack::{TaskId, TaskStack},
    templates::{MISSING_ATTRIBUTE, ProjectLookup, resolve_option_templates},
    workdir::WorkingDirGuard,
};

use super::{Flow, ReturnValues, Task, TaskState};

/// A task variant bound to its resolved state.
#[derive(Debug)]
pub struct TaskInstance<T: Task> {
    task: T,
    state: TaskState,
}

/// Collects collaborators and overrides for a [`TaskInstance`].
#[must_use = "call build() to construct the task"]
#[derive(Debug)]
pub struct TaskBuilder<T: Task> {
    task: T,
    project_config: Arc<ProjectConfig>,
    task_config: TaskConfig,
    org_config: Option<Arc<dyn OrgConfig>>,
    flow: Option<Arc<dyn Flow>>,
    name: Option<String>,
    step_num: Option<String>,
    logger: Option<TaskLogger>,
    overrides: TaskOptions,
    sleeper: Option<Arc<dyn Sleeper>>,
    capture_output: Option<bool>,
    debug_mode: Option<bool>,
}

impl<T: Task> TaskBuilder<T> {
    pub fn org_config(mut self, org_config: Arc<dyn OrgConfig>) -> Self {
        self.org_config = Some(org_config);
        self
    }

    pub fn flow(mut self, flow: Arc<dyn Flow>) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn step_num(mut self, step_num: impl ToString) -> Self {
        self.step_num = Some(step_num.to_string());
        self
    }

    /// Use `logger` instead of deriving one from the flow.
    pub fn logger(mut self, logger: TaskLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Override a single configured option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn options(mut self, overrides: TaskOptions) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Override the process-wide output capture switch.
    pub fn capture_output(mut self, enabled: bool) -> Self {
        self.capture_output = Some(enabled);
        self
    }

    /// Override the process-wide debug switch.
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = Some(enabled);
        self
    }

    /// Resolve and validate options, producing a ready-to-call task.
    pub fn build(self) -> Result<TaskInstance<T>, TaskError> {
        let settings = EngineSettings::global();
        let class_name = self.task.class_name();
        let logger = match (self.logger, &self.flow) {
            (Some(logger), _) => logger,
            (None, Some(flow)) => flow.logger().child(&class_name),
            (None, None) => TaskLogger::default(),
        };

        let schema = self.task.task_options();
        let mut options = merge_options(self.task_config.options.as_ref(), self.overrides);
        apply_schema_defaults(&mut options, &schema);
        let lookup = ProjectLookup::from_project(&self.project_config);
        for attribute in resolve_option_templates(&mut options, &lookup) {
            logger.warning(format!(
                "Project config attribute '{attribute}' is not defined; substituted '{MISSING_ATTRIBUTE}'"
            ));
        }
        validate_options(&class_name, &schema, &options)?;

        let debug_mode = self.debug_mode.unwrap_or(settings.debug_mode);
        if debug_mode {
            logger.debug("Options:");
            for (key, value) in redact_options(&options) {
                logger.debug(format!("  {key}: {}", display_option(&value)));
            }
        }

        let capture = self.capture_output.unwrap_or(settings.capture_task_output);
        let id = TaskId::next();
        debug!(task = %class_name, task_id = ?id, logger = %logger.name(), "task constructed");

        let state = TaskState {
            id,
            class_name,
            name: self.name.or_else(|| self.task_config.name.clone()),
            project_config: self.project_config,
            task_config: self.task_config,
            org_config: self.org_config,
            flow: self.flow,
            step_num: self.step_num,
            output: OutputCapture::new(logger.clone(), capture),
            logger,
            options,
            return_values: ReturnValues::new(),
            poll: PollState::default(),
            result: None,
            working_path: None,
            debug_mode,
            sleeper: self.sleeper.unwrap_or_else(|| Arc::new(ThreadSleeper)),
            stack: TaskStack::current(),
        };
        Ok(TaskInstance { task: self.task, state })
    }
}

fn display_option(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl<T: Task> TaskInstance<T> {
    pub fn builder(task: T, project_config: Arc<ProjectConfig>, task_config: TaskConfig) -> TaskBuilder<T> {
        TaskBuilder {
            task,
            project_config,
            task_config,
            org_config: None,
            flow: None,
            name: None,
            step_num: None,
            logger: None,
            overrides: TaskOptions::new(),
            sleeper: None,
            capture_output: None,
            debug_mode: None,
        }
    }

    /// Invoke the task on the calling thread's default stack.
    pub fn call(&mut self) -> Result<ReturnValues, TaskError> {
        self.call_in(&TaskStack::current())
    }

    /// Invoke the task, tracking it on `stack`.
    ///
    /// The body reaches the same stack through [`TaskState::stack`]. Guards
    /// acquired here (stack frame, working directory, output capture) are
    /// released in reverse order whether the body succeeds or fails.
    pub fn call_in(&mut self, stack: &TaskStack) -> Result<ReturnValues, TaskError> {
        let Self { task, state } = self;
        if task.requires_org() && state.org_config.is_none() {
            return Err(TaskError::RequiresOrg);
        }
        task.update_credentials(state).map_err(TaskError::Credentials)?;
        task.init_task(state)?;

        state.stack = stack.clone();
        let _frame = stack.push(state.frame());
        let workdir = WorkingDirGuard::enter(state.project_config.repo_root())?;
        state.working_path = Some(workdir.original().to_path_buf());
        let _output = state.output.scope();

        log_begin(task, state);
        let value = task.run_task(state)?;
        state.result = Some(value);
        Ok(state.return_values.clone())
    }

    /// Freeze this task at `step` into UI steps.
    pub fn freeze(&self, step: &StepDescriptor) -> Vec<UiStep> {
        freeze_task(&self.state, step)
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn task_mut(&mut self) -> &mut T {
        &mut self.task
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TaskState {
        &mut self.state
    }

    pub fn options(&self) -> &TaskOptions {
        &self.state.options
    }

    pub fn return_values(&self) -> &ReturnValues {
        &self.state.return_values
    }

    pub fn result(&self) -> Option<&Value> {
        self.state.result()
    }

    pub fn logger(&self) -> &TaskLogger {
        &self.state.logger
    }
}

fn log_begin<T: Task + ?Sized>(task: &T, state: &TaskState) {
    let logger = &state.logger;
    logger.info(format!("Beginning task: {}", state.class_name));
    if task.requires_org()
        && state.flow.is_none()
        && let Some(org) = &state.org_config
    {
        logger.info(format!("As user: {}", org.username().unwrap_or_default()));
        logger.info(format!("In org: {}", org.org_id().unwrap_or_default()));
    }
    logger.info("");
}
