//! Process-wide engine switches.
//!
//! Both switches are read from the environment exactly once, the first time any
//! task is constructed. Changing the variables afterwards has no effect on the
//! running process.

use once_cell::sync::Lazy;

/// When set, output written by task bodies is routed into the task logger.
pub const CAPTURE_TASK_OUTPUT_ENV: &str = "CAPTURE_TASK_OUTPUT";
/// When set, tasks log their resolved (redacted) options at debug level.
pub const DEBUG_MODE_ENV: &str = "STAGEHAND_DEBUG";

static GLOBAL_SETTINGS: Lazy<EngineSettings> = Lazy::new(EngineSettings::from_environment);

/// Switches shared by every task in the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub capture_task_output: bool,
    pub debug_mode: bool,
}

impl EngineSettings {
    /// Settings captured at first use.
    pub fn global() -> &'static EngineSettings {
        &GLOBAL_SETTINGS
    }

    /// Read the settings from the current environment.
    pub fn from_environment() -> Self {
        Self {
            capture_task_output: flag_enabled(std::env::var(CAPTURE_TASK_OUTPUT_ENV).ok()),
            debug_mode: flag_enabled(std::env::var(DEBUG_MODE_ENV).ok()),
        }
    }
}

fn flag_enabled(raw: Option<String>) -> bool {
    match raw {
        None => false,
        Some(value) => !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "no" | "off"),
    }
}
