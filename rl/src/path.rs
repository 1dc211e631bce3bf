//! Default log locations derived from the calling script
//!
//! A script at `/app/jobs/sync.py` logs to `/app/jobs/logs/sync`.

use std::path::{Path, PathBuf};

/// Name of the directory holding logs next to the script
pub const LOGS_DIR: &str = "logs";

/// Script file name without its extension
pub fn script_name(script_path: impl AsRef<Path>) -> String {
    script_path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `dirname(script)/logs/<script stem>`
pub fn resolve_default(script_path: impl AsRef<Path>) -> PathBuf {
    let script_path = script_path.as_ref();
    let dir = script_path.parent().unwrap_or_else(|| Path::new(""));
    dir.join(LOGS_DIR).join(script_name(script_path))
}

/// Same as [`resolve_default`] with an explicit file extension appended
pub fn resolve_default_with_extension(script_path: impl AsRef<Path>, extension: &str) -> PathBuf {
    let base = resolve_default(script_path);
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return base;
    }
    let mut name = base.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(extension);
    base.with_file_name(name)
}

/// Anchor a relative script path at the current working directory
///
/// Falls back to the path as given when the working directory is unreadable.
pub fn absolute_script_path(script_path: impl AsRef<Path>) -> PathBuf {
    let script_path = script_path.as_ref();
    if script_path.is_absolute() {
        return script_path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(script_path))
        .unwrap_or_else(|_| script_path.to_path_buf())
}
