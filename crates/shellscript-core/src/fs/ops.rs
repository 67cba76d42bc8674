//! Create, remove, move and rename.

use crate::error::{Result, ShellError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// How [`rmdir`] treats a directory that still has entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RmdirMode {
    /// Remove the directory and everything below it.
    #[default]
    Recursive,
    /// Refuse with `DirectoryNotEmpty` unless the directory is empty.
    MustBeEmpty,
}

/// What kind of entry [`rm`] expects to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveKind {
    /// Only regular files (and symlinks).
    File,
    /// Only directories, removed recursively.
    Directory,
    /// Whatever is there.
    #[default]
    Any,
}

/// Options for [`touch`].
#[derive(Debug, Clone, Copy)]
pub struct TouchOptions {
    /// Permission bits for a newly created file (Unix only).
    pub mode: u32,
    /// When false, touching an existing file fails with `AlreadyExists`.
    pub exist_ok: bool,
}

impl Default for TouchOptions {
    fn default() -> Self {
        Self {
            mode: 0o666,
            exist_ok: true,
        }
    }
}

/// Remove a directory.
pub fn rmdir(path: impl AsRef<Path>, mode: RmdirMode) -> Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(ShellError::NotADirectory(path.to_path_buf()));
    }
    match mode {
        RmdirMode::Recursive => {
            fs::remove_dir_all(path).map_err(|e| ShellError::io_with_path(e, path))?;
        }
        RmdirMode::MustBeEmpty => {
            let mut entries = fs::read_dir(path).map_err(|e| ShellError::io_with_path(e, path))?;
            if entries.next().is_some() {
                return Err(ShellError::DirectoryNotEmpty(path.to_path_buf()));
            }
            fs::remove_dir(path).map_err(|e| ShellError::io_with_path(e, path))?;
        }
    }
    debug!("Removed directory {}", path.display());
    Ok(())
}

/// Remove a file or directory, checking it is the expected kind first.
pub fn rm(path: impl AsRef<Path>, kind: RemoveKind) -> Result<()> {
    let path = path.as_ref();
    let meta = fs::symlink_metadata(path).map_err(|e| ShellError::io_with_path(e, path))?;
    let is_dir = meta.is_dir();

    match (kind, is_dir) {
        (RemoveKind::File, true) => return Err(ShellError::NotAFile(path.to_path_buf())),
        (RemoveKind::Directory, false) => {
            return Err(ShellError::NotADirectory(path.to_path_buf()))
        }
        _ => {}
    }

    if is_dir {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("Removed {}", path.display());
    Ok(())
}

/// Create a directory. With `parents`, missing ancestors are created and an
/// existing directory is not an error.
pub fn mkdir(path: impl AsRef<Path>, parents: bool) -> Result<()> {
    let path = path.as_ref();
    if parents {
        fs::create_dir_all(path)
    } else {
        fs::create_dir(path)
    }
    .map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("Created directory {}", path.display());
    Ok(())
}

/// Create an empty file, or bump the modification time of an existing one.
pub fn touch(path: impl AsRef<Path>, options: TouchOptions) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        if !options.exist_ok {
            return Err(ShellError::AlreadyExists(path.to_path_buf()));
        }
        let file = fs::OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| ShellError::io_with_path(e, path))?;
        file.set_modified(std::time::SystemTime::now())
            .map_err(|e| ShellError::io_with_path(e, path))?;
        debug!("Touched {}", path.display());
        return Ok(());
    }

    let mut open = fs::OpenOptions::new();
    open.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open.mode(options.mode);
    }
    open.open(path)
        .map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("Created {}", path.display());
    Ok(())
}

/// Move a file or directory. When `dest` is an existing directory the source
/// is moved into it.
///
/// Falls back to copy and delete when the rename crosses file systems.
pub fn mv(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<PathBuf> {
    let src = src.as_ref();
    let dest = dest.as_ref();
    if !src.exists() {
        return Err(ShellError::FileNotFound(src.to_path_buf()));
    }

    let target = if dest.is_dir() {
        dest.join(super::path::file_name(src))
    } else {
        dest.to_path_buf()
    };

    match fs::rename(src, &target) {
        Ok(()) => {}
        Err(e) if is_cross_device(&e) => {
            debug!("Cross-device move, copying {} instead", src.display());
            super::copy::cp(src, &target)?;
            rm(src, RemoveKind::Any)?;
        }
        Err(e) => return Err(ShellError::io_with_path(e, src)),
    }
    debug!("Moved {} -> {}", src.display(), target.display());
    Ok(target)
}

fn is_cross_device(err: &std::io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(nix::errno::Errno::EXDEV as i32)
    }
    #[cfg(windows)]
    {
        // ERROR_NOT_SAME_DEVICE
        err.raw_os_error() == Some(17)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = err;
        false
    }
}

/// Rename an entry in place, keeping its parent directory.
///
/// `new_name` must be a bare name; anything with a separator is rejected.
pub fn rename_only(path: impl AsRef<Path>, new_name: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let new_name = new_name.as_ref();
    if new_name.components().count() != 1 || new_name.file_name().is_none() {
        return Err(ShellError::invalid(
            "new_name",
            format!("{} must be a single file name", new_name.display()),
        ));
    }

    let target = path
        .parent()
        .map(|parent| parent.join(new_name))
        .unwrap_or_else(|| new_name.to_path_buf());
    fs::rename(path, &target).map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("Renamed {} -> {}", path.display(), target.display());
    Ok(target)
}

/// Move an entry into an existing directory, keeping its name.
pub fn move_to_dir(path: impl AsRef<Path>, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ShellError::NotADirectory(dir.to_path_buf()));
    }
    mv(path, dir)
}

/// Rename every entry called `search_name` below `dir` to `new_name`.
///
/// Directories are renamed too when `include_dirs` is set. Returns the new
/// paths, deepest first.
pub fn rename_recursively(
    dir: impl AsRef<Path>,
    search_name: &str,
    new_name: &str,
    include_dirs: bool,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ShellError::NotADirectory(dir.to_path_buf()));
    }

    // Children before parents, so renaming a directory never invalidates a
    // path collected below it.
    let mut matches = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| ShellError::Io {
            message: e.to_string(),
            path: e.path().map(Path::to_path_buf),
            source: e.into_io_error(),
        })?;
        if entry.file_name() != search_name {
            continue;
        }
        if entry.file_type().is_dir() && !include_dirs {
            continue;
        }
        matches.push(entry.into_path());
    }

    matches
        .iter()
        .map(|path| rename_only(path, new_name))
        .collect()
}
