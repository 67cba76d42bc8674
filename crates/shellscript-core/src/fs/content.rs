//! Whole-file read and write helpers.

use crate::error::{Result, ShellError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Read a whole UTF-8 text file.
///
/// Large files are read fully into memory.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| ShellError::io_with_path(e, path))
}

/// Like [`read_text`], but any I/O failure yields an empty string.
pub fn read_text_or_empty(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            debug!("Ignoring read error on {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Read a whole file as bytes.
pub fn read_bytes(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| ShellError::io_with_path(e, path))
}

/// Replace the contents of `path` with `content`, creating the file if needed.
pub fn write_text(path: impl AsRef<Path>, content: impl AsRef<str>) -> Result<()> {
    write_bytes(path, content.as_ref().as_bytes())
}

/// Replace the contents of `path` with `content`.
pub fn write_bytes(path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content).map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Write each item of `lines` back to back. No separators are inserted, so
/// items are expected to carry their own line endings.
pub fn write_lines<I, S>(path: impl AsRef<Path>, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    let mut file = fs::File::create(path).map_err(|e| ShellError::io_with_path(e, path))?;
    for line in lines {
        file.write_all(line.as_ref().as_bytes())
            .map_err(|e| ShellError::io_with_path(e, path))?;
    }
    file.flush().map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("Wrote lines to {}", path.display());
    Ok(())
}

/// Append `content` to `path`, creating the file if needed.
pub fn append_text(path: impl AsRef<Path>, content: impl AsRef<str>) -> Result<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ShellError::io_with_path(e, path))?;
    file.write_all(content.as_ref().as_bytes())
        .map_err(|e| ShellError::io_with_path(e, path))
}
