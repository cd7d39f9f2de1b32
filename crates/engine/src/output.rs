//! Routing of task output into the task logger.
//!
//! Task bodies write through [`TaskOutput`] handles obtained from their state.
//! While a capture scope is open and capture is enabled, each complete line is
//! logged (stdout at info, stderr at error). Otherwise bytes go straight to the
//! process streams.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard},
};

use crate::logger::TaskLogger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug)]
struct CaptureState {
    enabled: bool,
    active: bool,
    logger: TaskLogger,
    pending_stdout: Vec<u8>,
    pending_stderr: Vec<u8>,
}

impl CaptureState {
    fn pending(&mut self, stream: OutputStream) -> &mut Vec<u8> {
        match stream {
            OutputStream::Stdout => &mut self.pending_stdout,
            OutputStream::Stderr => &mut self.pending_stderr,
        }
    }

    fn emit(&self, stream: OutputStream, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let line = text.strip_suffix('\r').unwrap_or(&text);
        match stream {
            OutputStream::Stdout => self.logger.info(line),
            OutputStream::Stderr => self.logger.error(line),
        }
    }

    fn take_complete_lines(&mut self, stream: OutputStream) {
        loop {
            let pending = self.pending(stream);
            let Some(newline) = pending.iter().position(|byte| *byte == b'\n') else {
                break;
            };
            let line: Vec<u8> = pending.drain(..=newline).collect();
            self.emit(stream, &line[..line.len() - 1]);
        }
    }

    fn flush_partial(&mut self, stream: OutputStream) {
        let rest = std::mem::take(self.pending(stream));
        if !rest.is_empty() {
            self.emit(stream, &rest);
        }
    }
}

/// Shared capture state of one task instance.
#[derive(Debug, Clone)]
pub struct OutputCapture {
    state: Arc<Mutex<CaptureState>>,
}

impl OutputCapture {
    pub fn new(logger: TaskLogger, enabled: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState {
                enabled,
                active: false,
                logger,
                pending_stdout: Vec::new(),
                pending_stderr: Vec::new(),
            })),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// True while a scope is open and capture is enabled.
    pub fn is_capturing(&self) -> bool {
        let state = self.lock();
        state.enabled && state.active
    }

    pub fn stdout(&self) -> TaskOutput {
        TaskOutput {
            stream: OutputStream::Stdout,
            capture: self.clone(),
        }
    }

    pub fn stderr(&self) -> TaskOutput {
        TaskOutput {
            stream: OutputStream::Stderr,
            capture: self.clone(),
        }
    }

    /// Open a capture scope; partial lines are flushed when it drops.
    pub fn scope(&self) -> OutputScope {
        self.lock().active = true;
        OutputScope { capture: self.clone() }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Writer for one output stream of a task.
#[derive(Debug, Clone)]
pub struct TaskOutput {
    stream: OutputStream,
    capture: OutputCapture,
}

impl TaskOutput {
    pub fn stream(&self) -> OutputStream {
        self.stream
    }
}

impl Write for TaskOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.capture.lock();
        if !(state.enabled && state.active) {
            drop(state);
            return match self.stream {
                OutputStream::Stdout => io::stdout().write(buf),
                OutputStream::Stderr => io::stderr().write(buf),
            };
        }
        state.pending(self.stream).extend_from_slice(buf);
        state.take_complete_lines(self.stream);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let captured = self.capture.is_capturing();
        match (captured, self.stream) {
            (true, _) => Ok(()),
            (false, OutputStream::Stdout) => io::stdout().flush(),
            (false, OutputStream::Stderr) => io::stderr().flush(),
        }
    }
}

/// Ends a capture scope when dropped.
#[must_use = "capture ends as soon as the scope is dropped"]
#[derive(Debug)]
pub struct OutputScope {
    capture: OutputCapture,
}

impl Drop for OutputScope {
    fn drop(&mut self) {
        let mut state = self.capture.lock();
        if state.enabled {
            state.flush_partial(OutputStream::Stdout);
            state.flush_partial(OutputStream::Stderr);
        }
        state.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogLevel;

    #[test]
    fn complete_lines_are_logged_by_stream() {
        let logger = TaskLogger::new("stagehand.tasks.Capture");
        let capture = OutputCapture::new(logger.clone(), true);
        let scope = capture.scope();

        write!(capture.stdout(), "deploying\nchecking").unwrap();
        writeln!(capture.stderr(), "warning: slow org").unwrap();
        assert_eq!(logger.messages(), vec!["deploying", "warning: slow org"]);

        drop(scope);

        let lines = logger.lines();
        assert_eq!(logger.messages(), vec!["deploying", "warning: slow org", "checking"]);
        assert_eq!(lines[0].level, LogLevel::Info);
        assert_eq!(lines[1].level, LogLevel::Error);
        assert_eq!(lines[2].level, LogLevel::Info);
        assert!(!capture.is_capturing());
    }

    #[test]
    fn windows_line_endings_are_trimmed() {
        let logger = TaskLogger::new("stagehand.tasks.Capture");
        let capture = OutputCapture::new(logger.clone(), true);
        let _scope = capture.scope();

        capture.stdout().write_all(b"line one\r\nline two\r\n").unwrap();

        assert_eq!(logger.messages(), vec!["line one", "line two"]);
    }

    #[test]
    fn disabled_capture_leaves_the_logger_untouched() {
        let logger = TaskLogger::new("stagehand.tasks.Capture");
        let capture = OutputCapture::new(logger.clone(), false);
        let _scope = capture.scope();

        writeln!(capture.stdout(), "to the terminal").unwrap();

        assert!(!capture.is_capturing());
        assert!(logger.messages().is_empty());
    }
}
