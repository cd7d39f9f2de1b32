use std::path::{Path, PathBuf};

use dirs_next::home_dir;

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    match trimmed {
        "~" => home(),
        _ => match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
            Some(rest) => home().join(rest),
            None => PathBuf::from(trimmed),
        },
    }
}

/// Resolves a configured directory against `base`.
///
/// Absolute and `~` paths are used as-is (after expansion); relative paths are
/// joined onto `base`, the directory of the document that declared them.
pub fn resolve_against(base: &Path, configured: &str) -> PathBuf {
    let expanded = expand_tilde(configured);
    if expanded.is_absolute() { expanded } else { base.join(expanded) }
}
