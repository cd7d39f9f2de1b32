//! Scoped working-directory changes around a task body.

use std::{
    env,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::error::TaskError;

/// Restores the process working directory when dropped.
///
/// The directory recorded on entry is restored whenever it differs from the
/// current one, so a body that changes directory on its own is also undone.
#[derive(Debug)]
#[must_use = "the original directory is restored as soon as the guard is dropped"]
pub struct WorkingDirGuard {
    original: PathBuf,
}

impl WorkingDirGuard {
    /// Record the current directory and switch to `target` when given.
    pub fn enter(target: Option<&Path>) -> Result<Self, TaskError> {
        let original = env::current_dir().map_err(|source| TaskError::WorkingDirectory {
            path: PathBuf::from("."),
            source,
        })?;
        if let Some(target) = target {
            env::set_current_dir(target).map_err(|source| TaskError::WorkingDirectory {
                path: target.to_path_buf(),
                source,
            })?;
        }
        Ok(Self { original })
    }

    /// Directory that will be restored.
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        let unchanged = env::current_dir().is_ok_and(|current| current == self.original);
        if unchanged {
            return;
        }
        if let Err(error) = env::set_current_dir(&self.original) {
            warn!(
                path = %self.original.display(),
                error = %error,
                "failed to restore working directory"
            );
        }
    }
}

/// Serializes tests that change the process-wide working directory.
#[cfg(test)]
pub(crate) fn cwd_lock() -> std::sync::MutexGuard<'static, ()> {
    static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enters_target_and_restores_on_drop() {
        let _lock = cwd_lock();
        let before = env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().canonicalize().unwrap();

        {
            let guard = WorkingDirGuard::enter(Some(&target)).unwrap();
            assert_eq!(guard.original(), before.as_path());
            assert_eq!(env::current_dir().unwrap().canonicalize().unwrap(), target);
        }

        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn restores_directory_changed_inside_the_scope() {
        let _lock = cwd_lock();
        let before = env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();

        {
            let _guard = WorkingDirGuard::enter(None).unwrap();
            env::set_current_dir(dir.path()).unwrap();
        }

        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn missing_target_is_reported() {
        let _lock = cwd_lock();
        let before = env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let error = WorkingDirGuard::enter(Some(&missing)).expect_err("directory is missing");

        assert!(matches!(error, TaskError::WorkingDirectory { ref path, .. } if path == &missing));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
