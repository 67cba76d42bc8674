//! Path helpers that never touch the file system, plus the working directory.

use crate::error::{Result, ShellError};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Expand a leading `~` to the user's home directory.
///
/// `~user` forms are left alone, as is any path when the home directory
/// cannot be determined.
pub fn expand_user(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// The final component of a path (name with extension), as a relative path.
pub fn file_name(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref()
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_default()
}

/// Return `path` with its extension replaced. The leading dot is optional.
///
/// Only the returned value changes; nothing is renamed on disk.
pub fn with_extension(path: impl AsRef<Path>, extension: &str) -> PathBuf {
    path.as_ref()
        .with_extension(extension.strip_prefix('.').unwrap_or(extension))
}

/// Check a file's extension against a list, case-insensitively.
///
/// - `["txt", "md"]` accepts `*.txt` and `*.md`
/// - `["*"]` accepts everything
/// - `[]` accepts nothing
/// - `[""]` accepts files without an extension
pub fn has_extension(path: impl AsRef<Path>, extensions: &[&str]) -> bool {
    let Some(first) = extensions.first() else {
        return false;
    };
    if *first == "*" {
        return true;
    }
    let ext = path
        .as_ref()
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    extensions.iter().any(|allowed| allowed.to_lowercase() == ext)
}

/// True if the string contains glob metacharacters (`*`, `?`, `[`).
pub fn contains_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Current working directory.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(ShellError::from)
}

/// Alias for [`current_dir`].
pub fn cwd() -> Result<PathBuf> {
    current_dir()
}

/// Change the working directory of the whole process. `~` is expanded.
pub fn set_current_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = expand_user(path);
    if !path.exists() {
        return Err(ShellError::FileNotFound(path));
    }
    if !path.is_dir() {
        return Err(ShellError::NotADirectory(path));
    }
    std::env::set_current_dir(&path).map_err(|e| ShellError::io_with_path(e, &path))?;
    debug!("cd {}", path.display());
    Ok(())
}

/// Alias for [`set_current_dir`].
pub fn cd(path: impl AsRef<Path>) -> Result<()> {
    set_current_dir(path)
}
