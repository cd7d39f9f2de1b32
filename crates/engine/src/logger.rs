//! Named task loggers.
//!
//! Every line a task logs is emitted as a `tracing` event and also appended to
//! an in-memory history shared along the logger hierarchy, so a flow (or a UI
//! replaying a run) can read back exactly what each task reported.
//!
//! The history is a ring buffer: once it holds its limit of lines (by default
//! [`DEFAULT_HISTORY_LIMIT`]) the oldest line is dropped for every new one.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Lines kept by a logger hierarchy unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 10_000;

/// Severity of a recorded log line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One recorded log line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Dotted name of the logger that produced the line.
    pub logger: String,
    pub message: String,
}

/// Hierarchical, cloneable logger handed to tasks.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    name: Arc<str>,
    history: Arc<Mutex<History>>,
}

#[derive(Debug)]
struct History {
    lines: VecDeque<LogLine>,
    limit: usize,
}

impl Default for TaskLogger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

impl TaskLogger {
    /// Name of the logger used by tasks that run outside a flow.
    pub const DEFAULT_NAME: &'static str = "stagehand.tasks";

    pub fn new(name: impl Into<String>) -> Self {
        Self::with_history_limit(name, DEFAULT_HISTORY_LIMIT)
    }

    /// Logger whose hierarchy keeps at most `limit` lines.
    pub fn with_history_limit(name: impl Into<String>, limit: usize) -> Self {
        Self {
            name: Arc::from(name.into()),
            history: Arc::new(Mutex::new(History {
                lines: VecDeque::new(),
                limit,
            })),
        }
    }

    /// Child logger `<name>.<suffix>` sharing this logger's history.
    pub fn child(&self, suffix: &str) -> Self {
        Self {
            name: Arc::from(format!("{}.{}", self.name, suffix)),
            history: Arc::clone(&self.history),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.record(LogLevel::Debug, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(LogLevel::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.record(LogLevel::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(LogLevel::Error, message.into());
    }

    /// Retained lines recorded by this logger and its relatives, oldest first.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lock_history().lines.iter().cloned().collect()
    }

    /// Messages of [`lines`](Self::lines) without metadata.
    pub fn messages(&self) -> Vec<String> {
        self.lock_history().lines.iter().map(|line| line.message.clone()).collect()
    }

    fn record(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Debug => debug!(logger = %self.name, "{message}"),
            LogLevel::Info => info!(logger = %self.name, "{message}"),
            LogLevel::Warning => warn!(logger = %self.name, "{message}"),
            LogLevel::Error => error!(logger = %self.name, "{message}"),
        }
        let mut history = self.lock_history();
        if history.limit == 0 {
            return;
        }
        if history.lines.len() == history.limit {
            history.lines.pop_front();
        }
        history.lines.push_back(LogLine {
            timestamp: Utc::now(),
            level,
            logger: self.name.to_string(),
            message,
        });
    }

    fn lock_history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_loggers_extend_the_name_and_share_history() {
        let flow_logger = TaskLogger::new("stagehand.flows.release");
        let task_logger = flow_logger.child("CreateRelease");

        flow_logger.info("Running flow");
        task_logger.warning("Tag already exists");

        assert_eq!(task_logger.name(), "stagehand.flows.release.CreateRelease");
        let lines = flow_logger.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].logger, "stagehand.flows.release.CreateRelease");
        assert_eq!(lines[1].level, LogLevel::Warning);
    }

    #[test]
    fn history_drops_the_oldest_lines_past_its_limit() {
        let flow_logger = TaskLogger::with_history_limit("stagehand.flows.release", 2);
        let task_logger = flow_logger.child("CreateRelease");

        flow_logger.info("first");
        task_logger.info("second");
        task_logger.info("third");

        assert_eq!(flow_logger.messages(), vec!["second".to_string(), "third".to_string()]);

        let silent = TaskLogger::with_history_limit("stagehand.quiet", 0);
        silent.info("not kept");
        assert!(silent.lines().is_empty());
    }

    #[test]
    fn independent_loggers_keep_separate_history() {
        let first = TaskLogger::default();
        let second = TaskLogger::default();
        first.info("only here");

        assert_eq!(first.messages(), vec!["only here".to_string()]);
        assert!(second.messages().is_empty());
    }
}
