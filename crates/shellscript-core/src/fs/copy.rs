//! Copying files and directory trees, with optional progress reporting.

use crate::config::FileConfig;
use crate::error::{Result, ShellError};
use std::fs::{self, File, FileTimes};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use walkdir::WalkDir;

/// One progress notification from [`copy_file_with_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyProgress {
    /// Bytes written by the chunk that triggered this call. Zero on the final call.
    pub chunk_len: usize,
    /// Bytes written so far.
    pub copied: u64,
    /// Size of the source file.
    pub total: u64,
}

impl CopyProgress {
    /// True for the last notification of a copy.
    pub fn is_final(&self) -> bool {
        self.chunk_len == 0
    }

    /// Completion in percent, 100 for empty files.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.copied.min(self.total) * 100) / self.total) as u8
    }
}

/// Options for [`copy_file_with_progress`].
#[derive(Debug, Clone, Copy)]
pub struct CopyOptions {
    /// When false and the source is a symlink, the link itself is recreated.
    pub follow_symlinks: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
        }
    }
}

fn resolve_dest(src: &Path, dest: &Path) -> PathBuf {
    if dest.is_dir() {
        dest.join(super::path::file_name(src))
    } else {
        dest.to_path_buf()
    }
}

/// Both paths exist and resolve to the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn ensure_distinct(src: &Path, target: &Path) -> Result<()> {
    if same_file(src, target) {
        return Err(ShellError::invalid(
            "dest",
            format!("{} and {} are the same file", src.display(), target.display()),
        ));
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet: the longest existing
/// prefix is canonicalized and the missing components appended.
fn resolve_absolute(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(real) = fs::canonicalize(current) {
            return missing.iter().rev().fold(real, |acc, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Copy the modification and access times of `src` onto `dest`.
fn copy_times(src: &Path, dest: &Path) -> Result<()> {
    let meta = fs::metadata(src).map_err(|e| ShellError::io_with_path(e, src))?;
    let mut times = FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    let file = fs::OpenOptions::new()
        .write(true)
        .open(dest)
        .map_err(|e| ShellError::io_with_path(e, dest))?;
    file.set_times(times)
        .map_err(|e| ShellError::io_with_path(e, dest))
}

/// Copy one file. `dest` may be a directory, in which case the file keeps its
/// name. Content, permission bits and timestamps are copied.
pub fn copy_file(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<PathBuf> {
    let src = src.as_ref();
    if !src.is_file() {
        return Err(if src.exists() {
            ShellError::NotAFile(src.to_path_buf())
        } else {
            ShellError::FileNotFound(src.to_path_buf())
        });
    }
    let target = resolve_dest(src, dest.as_ref());
    ensure_distinct(src, &target)?;

    fs::copy(src, &target).map_err(|e| ShellError::io_with_path(e, &target))?;
    // Read-only copies cannot be opened for writing to set times.
    if let Err(e) = copy_times(src, &target) {
        debug!("Timestamps not copied to {}: {}", target.display(), e);
    }
    debug!("Copied {} -> {}", src.display(), target.display());
    Ok(target)
}

/// Copy a directory tree into `dest`, creating it. Returns the number of
/// files copied.
///
/// `dest` must not be `src` itself or lie inside it.
pub fn copy_dir(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<u64> {
    let src = src.as_ref();
    let dest = dest.as_ref();
    if !src.is_dir() {
        return Err(ShellError::NotADirectory(src.to_path_buf()));
    }
    let real_src = fs::canonicalize(src).map_err(|e| ShellError::io_with_path(e, src))?;
    if resolve_absolute(dest).starts_with(&real_src) {
        return Err(ShellError::invalid(
            "dest",
            format!("cannot copy {} into itself ({})", src.display(), dest.display()),
        ));
    }

    let mut copied = 0u64;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| ShellError::Io {
            message: e.to_string(),
            path: e.path().map(Path::to_path_buf),
            source: e.into_io_error(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ShellError::Other(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| ShellError::io_with_path(e, &target))?;
        } else {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }
    debug!("Copied {} files from {} -> {}", copied, src.display(), dest.display());
    Ok(copied)
}

/// Copy a file or a directory tree, depending on what `src` is.
pub fn cp(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    if src.is_dir() {
        copy_dir(src, dest)?;
    } else {
        copy_file(src, dest)?;
    }
    Ok(())
}

/// Copy a file in 1 MiB chunks, calling `observer` after every chunk and once
/// more with `chunk_len == 0` when done. Returns the bytes copied.
pub fn copy_file_with_progress<F>(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: CopyOptions,
    mut observer: F,
) -> Result<u64>
where
    F: FnMut(&CopyProgress),
{
    let src = src.as_ref();
    let target = resolve_dest(src, dest.as_ref());

    let link_meta = fs::symlink_metadata(src).map_err(|e| ShellError::io_with_path(e, src))?;
    if link_meta.file_type().is_symlink() && !options.follow_symlinks {
        let link_target = fs::read_link(src).map_err(|e| ShellError::io_with_path(e, src))?;
        symlink(&link_target, &target)?;
        debug!("Recreated symlink {} -> {}", target.display(), link_target.display());
        observer(&CopyProgress {
            chunk_len: 0,
            copied: 0,
            total: 0,
        });
        return Ok(0);
    }

    ensure_distinct(src, &target)?;
    let mut reader = File::open(src).map_err(|e| ShellError::io_with_path(e, src))?;
    let total = reader
        .metadata()
        .map_err(|e| ShellError::io_with_path(e, src))?
        .len();
    let mut writer = File::create(&target).map_err(|e| ShellError::io_with_path(e, &target))?;

    let mut buffer = vec![0u8; FileConfig::PROGRESS_COPY_BUFFER];
    let mut copied = 0u64;
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| ShellError::io_with_path(e, src))?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .map_err(|e| ShellError::io_with_path(e, &target))?;
        copied += read as u64;
        observer(&CopyProgress {
            chunk_len: read,
            copied,
            total,
        });
    }
    writer
        .flush()
        .map_err(|e| ShellError::io_with_path(e, &target))?;
    drop(writer);

    // Times first: a read-only target cannot be opened for writing afterwards.
    if let Err(e) = copy_times(src, &target) {
        debug!("Timestamps not copied to {}: {}", target.display(), e);
    }
    let permissions = fs::metadata(src)
        .map_err(|e| ShellError::io_with_path(e, src))?
        .permissions();
    fs::set_permissions(&target, permissions).map_err(|e| ShellError::io_with_path(e, &target))?;

    observer(&CopyProgress {
        chunk_len: 0,
        copied,
        total,
    });
    debug!("Copied {} bytes {} -> {}", copied, src.display(), target.display());
    Ok(copied)
}

fn symlink(original: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(original, link).map_err(|e| ShellError::io_with_path(e, link))
    }

    #[cfg(windows)]
    {
        if original.is_dir() {
            std::os::windows::fs::symlink_dir(original, link)
        } else {
            std::os::windows::fs::symlink_file(original, link)
        }
        .map_err(|e| ShellError::io_with_path(e, link))
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (original, link);
        Err(ShellError::unsupported("symlink"))
    }
}

/// Console progress bar for [`copy_file_with_progress`].
///
/// ```no_run
/// use shellscript::fs::{copy_file_with_progress, ConsoleProgress, CopyOptions};
///
/// let mut bar = ConsoleProgress::new();
/// copy_file_with_progress("big.iso", "/mnt/usb", CopyOptions::default(), |p| bar.update(p))?;
/// # Ok::<(), shellscript::ShellError>(())
/// ```
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    last_print: Option<Instant>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redraw the bar, at most once per second, and end the line on the
    /// final notification.
    pub fn update(&mut self, progress: &CopyProgress) {
        let due = self
            .last_print
            .map_or(true, |t| t.elapsed() >= FileConfig::PROGRESS_PRINT_INTERVAL);
        if !due && !progress.is_final() {
            return;
        }
        self.last_print = Some(Instant::now());

        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r{}", render_bar(progress, FileConfig::PROGRESS_BAR_WIDTH));
        if progress.is_final() {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }
}

/// Render `[=====     ]  42%  1 MB/3 MB`.
pub fn render_bar(progress: &CopyProgress, width: usize) -> String {
    let percent = progress.percent() as usize;
    let filled = width * percent / 100;
    format!(
        "[{}{}] {:>3}%  {}/{}",
        "=".repeat(filled),
        " ".repeat(width - filled),
        percent,
        format_bytes(progress.copied, false),
        format_bytes(progress.total, false)
    )
}

/// Human readable byte count, rounded to a whole number.
///
/// `kibi` selects powers of 1024 (`KiB`, `MiB`, ...) instead of 1000
/// (`KB`, `MB`, ...).
pub fn format_bytes(count: u64, kibi: bool) -> String {
    const UNITS: [&str; 6] = ["", "K", "M", "G", "T", "P"];
    let base = if kibi { 1024.0 } else { 1000.0 };

    let mut value = count as f64;
    let mut unit = 0;
    while value >= base && unit < UNITS.len() - 1 {
        value /= base;
        unit += 1;
    }

    let suffix = match (unit, kibi) {
        (0, _) => "B".to_string(),
        (_, true) => format!("{}iB", UNITS[unit]),
        (_, false) => format!("{}B", UNITS[unit]),
    };
    format!("{} {}", group_thousands(value.round() as u64), suffix)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0, false), "0 B");
        assert_eq!(format_bytes(500, false), "500 B");
        assert_eq!(format_bytes(1000, false), "1 KB");
        assert_eq!(format_bytes(1500, false), "2 KB");
        assert_eq!(format_bytes(1024, true), "1 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024, true), "3 MiB");
        assert_eq!(format_bytes(2_500_000_000, false), "3 GB");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_render_bar() {
        let progress = CopyProgress {
            chunk_len: 10,
            copied: 50,
            total: 100,
        };
        assert_eq!(render_bar(&progress, 10), "[=====     ]  50%  50 B/100 B");
    }

    #[test]
    fn test_copy_file_into_dir() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.txt");
        let dest_dir = temp_dir.path().join("out");
        fs::write(&src, "hello").unwrap();
        fs::create_dir(&dest_dir).unwrap();

        let target = copy_file(&src, &dest_dir).unwrap();
        assert_eq!(target, dest_dir.join("a.txt"));
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");

        let src_mtime = fs::metadata(&src).unwrap().modified().unwrap();
        let dst_mtime = fs::metadata(&target).unwrap().modified().unwrap();
        assert_eq!(src_mtime, dst_mtime);
    }

    #[test]
    fn test_copy_file_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            copy_file(temp_dir.path().join("nope"), temp_dir.path().join("x")),
            Err(ShellError::FileNotFound(_))
        ));
        assert!(matches!(
            copy_file(temp_dir.path(), temp_dir.path().join("x")),
            Err(ShellError::NotAFile(_))
        ));
    }

    #[test]
    fn test_copy_dir_preserves_structure() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("sub").join("deeper")).unwrap();
        fs::write(src.join("top.txt"), "t").unwrap();
        fs::write(src.join("sub").join("mid.txt"), "m").unwrap();
        fs::write(src.join("sub").join("deeper").join("low.txt"), "l").unwrap();

        let dest = temp_dir.path().join("dest");
        assert_eq!(copy_dir(&src, &dest).unwrap(), 3);
        assert_eq!(fs::read_to_string(dest.join("top.txt")).unwrap(), "t");
        assert_eq!(
            fs::read_to_string(dest.join("sub").join("deeper").join("low.txt")).unwrap(),
            "l"
        );
    }

    #[test]
    fn test_cp_dispatches() {
        let temp_dir = TempDir::new().unwrap();
        let src_dir = temp_dir.path().join("tree");
        fs::create_dir(&src_dir).unwrap();
        fs::write(src_dir.join("f"), "1").unwrap();

        cp(&src_dir, temp_dir.path().join("tree2")).unwrap();
        assert!(temp_dir.path().join("tree2").join("f").is_file());

        cp(src_dir.join("f"), temp_dir.path().join("g")).unwrap();
        assert!(temp_dir.path().join("g").is_file());
    }

    #[test]
    fn test_copy_with_progress_reports_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("big.bin");
        let size = FileConfig::PROGRESS_COPY_BUFFER * 2 + 10;
        fs::write(&src, vec![7u8; size]).unwrap();

        let mut calls = Vec::new();
        let copied = copy_file_with_progress(
            &src,
            temp_dir.path().join("copy.bin"),
            CopyOptions::default(),
            |p| calls.push(*p),
        )
        .unwrap();

        assert_eq!(copied, size as u64);
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].chunk_len, FileConfig::PROGRESS_COPY_BUFFER);
        assert!(calls.last().unwrap().is_final());
        assert_eq!(calls.last().unwrap().copied, size as u64);
        assert_eq!(
            fs::read(temp_dir.path().join("copy.bin")).unwrap().len(),
            size
        );
    }

    #[test]
    fn test_copy_onto_itself_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.txt");
        fs::write(&src, "precious data").unwrap();

        assert!(matches!(
            copy_file(&src, temp_dir.path()),
            Err(ShellError::InvalidArgument { .. })
        ));
        assert!(matches!(
            copy_file(&src, &src),
            Err(ShellError::InvalidArgument { .. })
        ));
        assert!(matches!(
            copy_file_with_progress(&src, temp_dir.path(), CopyOptions::default(), |_| {}),
            Err(ShellError::InvalidArgument { .. })
        ));
        assert_eq!(fs::read_to_string(&src).unwrap(), "precious data");
    }

    #[test]
    fn test_copy_dir_into_itself_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("f.txt"), "x").unwrap();

        assert!(matches!(
            copy_dir(&src, src.join("sub")),
            Err(ShellError::InvalidArgument { .. })
        ));
        assert!(matches!(
            copy_dir(&src, &src),
            Err(ShellError::InvalidArgument { .. })
        ));
        assert!(!src.join("sub").exists());
        assert_eq!(fs::read_dir(&src).unwrap().count(), 1);

        // A sibling whose name merely starts with the source name is fine
        assert_eq!(copy_dir(&src, temp_dir.path().join("src2")).unwrap(), 1);
    }

    #[test]
    fn test_copy_with_progress_keeps_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("old.txt");
        fs::write(&src, "data").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let out = temp_dir.path().join("new.txt");
        copy_file_with_progress(&src, &out, CopyOptions::default(), |_| {}).unwrap();
        assert_eq!(fs::metadata(&out).unwrap().modified().unwrap(), old);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_with_progress_keeps_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real.txt");
        let link = temp_dir.path().join("link.txt");
        fs::write(&real, "data").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let out = temp_dir.path().join("out.txt");
        let options = CopyOptions {
            follow_symlinks: false,
        };
        copy_file_with_progress(&link, &out, options, |_| {}).unwrap();

        assert!(fs::symlink_metadata(&out).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&out).unwrap(), real);
    }
}
