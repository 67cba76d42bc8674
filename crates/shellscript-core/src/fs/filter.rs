//! Filtering and sorting path lists, in the spirit of `find(1)` predicates.

use super::meta;
use super::path::has_extension;
use crate::error::{Result, ShellError};
use crate::platform::{self, Owner};
use chrono::{DateTime, Local};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Entry type, as `find -type` spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `f`
    File,
    /// `d`
    Dir,
    /// `l`
    Symlink,
}

impl FromStr for EntryKind {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "f" => Ok(EntryKind::File),
            "d" => Ok(EntryKind::Dir),
            "l" => Ok(EntryKind::Symlink),
            other => Err(ShellError::invalid(
                "kind",
                format!("{:?} is not one of f, d, l", other),
            )),
        }
    }
}

/// Time window on one of the three file timestamps.
#[derive(Debug, Clone, Copy, Default)]
struct TimeWindow {
    before: Option<DateTime<Local>>,
    after: Option<DateTime<Local>>,
}

impl TimeWindow {
    fn is_set(&self) -> bool {
        self.before.is_some() || self.after.is_some()
    }

    fn contains(&self, time: DateTime<Local>) -> bool {
        self.before.map_or(true, |b| time < b) && self.after.map_or(true, |a| time > a)
    }
}

/// Builder of path predicates. Unset predicates accept everything, and
/// [`FileFilter::apply`] keeps the input order.
///
/// ```no_run
/// use shellscript::fs::{find, FileFilter};
///
/// let big_logs = FileFilter::new()
///     .files_only(true)
///     .extensions(&["log"])
///     .size_greater_than(1024 * 1024)
///     .apply(find("/var/log", "*", true)?);
/// # Ok::<(), shellscript::ShellError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    existing: Option<bool>,
    files_only: Option<bool>,
    dirs_only: Option<bool>,
    readable: Option<bool>,
    writable: Option<bool>,
    executable: Option<bool>,
    hidden: Option<bool>,
    symlink: Option<bool>,
    size_greater: Option<u64>,
    size_less: Option<u64>,
    extensions: Option<Vec<String>>,
    kind: Option<EntryKind>,
    modified: TimeWindow,
    accessed: TimeWindow,
    changed: TimeWindow,
    empty: Option<bool>,
    max_depth: Option<usize>,
    min_depth: Option<usize>,
}

impl FileFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only existing (`true`) or only missing (`false`) paths.
    pub fn existing(mut self, existing: bool) -> Self {
        self.existing = Some(existing);
        self
    }

    /// Keep only regular files (`true`) or everything else (`false`).
    pub fn files_only(mut self, files_only: bool) -> Self {
        self.files_only = Some(files_only);
        self
    }

    /// Keep only directories (`true`) or everything else (`false`).
    pub fn dirs_only(mut self, dirs_only: bool) -> Self {
        self.dirs_only = Some(dirs_only);
        self
    }

    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = Some(readable);
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn executable(mut self, executable: bool) -> Self {
        self.executable = Some(executable);
        self
    }

    /// Keep only hidden (`true`) or only visible (`false`) entries.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Keep only symlinks (`true`) or only non-links (`false`).
    pub fn symlink(mut self, symlink: bool) -> Self {
        self.symlink = Some(symlink);
        self
    }

    /// Files strictly larger than `bytes`. Non-files pass unchecked.
    pub fn size_greater_than(mut self, bytes: u64) -> Self {
        self.size_greater = Some(bytes);
        self
    }

    /// Files strictly smaller than `bytes`. Non-files pass unchecked.
    pub fn size_less_than(mut self, bytes: u64) -> Self {
        self.size_less = Some(bytes);
        self
    }

    /// Extension list with the rules of [`has_extension`].
    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = Some(extensions.iter().map(|e| e.to_string()).collect());
        self
    }

    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn modified_before(mut self, time: DateTime<Local>) -> Self {
        self.modified.before = Some(time);
        self
    }

    pub fn modified_after(mut self, time: DateTime<Local>) -> Self {
        self.modified.after = Some(time);
        self
    }

    pub fn accessed_before(mut self, time: DateTime<Local>) -> Self {
        self.accessed.before = Some(time);
        self
    }

    pub fn accessed_after(mut self, time: DateTime<Local>) -> Self {
        self.accessed.after = Some(time);
        self
    }

    pub fn changed_before(mut self, time: DateTime<Local>) -> Self {
        self.changed.before = Some(time);
        self
    }

    pub fn changed_after(mut self, time: DateTime<Local>) -> Self {
        self.changed.after = Some(time);
        self
    }

    /// Keep only empty (`true`) or only non-empty (`false`) files and directories.
    pub fn empty(mut self, empty: bool) -> Self {
        self.empty = Some(empty);
        self
    }

    /// Maximum number of path components.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Minimum number of path components.
    pub fn min_depth(mut self, depth: usize) -> Self {
        self.min_depth = Some(depth);
        self
    }

    /// Keep the paths that satisfy every configured predicate.
    pub fn apply<I, P>(&self, paths: I) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .map(Into::into)
            .filter(|p| self.matches(p))
            .collect()
    }

    /// Evaluate the predicates against one path.
    pub fn matches(&self, path: &Path) -> bool {
        let link_meta = fs::symlink_metadata(path).ok();
        let exists = path.exists();

        let flags = [
            (self.existing, exists),
            (self.files_only, path.is_file()),
            (self.dirs_only, path.is_dir()),
        ];
        if flags.iter().any(|(want, actual)| want.is_some_and(|w| w != *actual)) {
            return false;
        }
        if !flag_ok(self.readable, || platform::is_readable(path))
            || !flag_ok(self.writable, || platform::is_writable(path))
            || !flag_ok(self.executable, || platform::is_executable(path))
        {
            return false;
        }
        if let Some(hidden) = self.hidden {
            if is_hidden(path) != hidden {
                return false;
            }
        }

        let is_link = link_meta
            .as_ref()
            .is_some_and(|m| m.file_type().is_symlink());
        if let Some(symlink) = self.symlink {
            if is_link != symlink {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            let ok = match kind {
                EntryKind::File => path.is_file() && !is_link,
                EntryKind::Dir => path.is_dir() && !is_link,
                EntryKind::Symlink => is_link,
            };
            if !ok {
                return false;
            }
        }

        // Sizes only constrain regular files
        if (self.size_greater.is_some() || self.size_less.is_some()) && path.is_file() {
            let Ok(size) = meta::file_size(path) else {
                return false;
            };
            if self.size_greater.is_some_and(|min| size <= min)
                || self.size_less.is_some_and(|max| size >= max)
            {
                return false;
            }
        }

        if let Some(extensions) = &self.extensions {
            let list: Vec<&str> = extensions.iter().map(String::as_str).collect();
            if !has_extension(path, &list) {
                return false;
            }
        }

        if !time_ok(&self.modified, || meta::modified_time(path))
            || !time_ok(&self.accessed, || meta::accessed_time(path))
            || !time_ok(&self.changed, || meta::changed_time(path))
        {
            return false;
        }

        if let Some(empty) = self.empty {
            if is_empty(path) != Some(empty) {
                return false;
            }
        }

        let depth = path.components().count();
        if self.max_depth.is_some_and(|max| depth > max)
            || self.min_depth.is_some_and(|min| depth < min)
        {
            return false;
        }
        true
    }
}

fn flag_ok(want: Option<bool>, check: impl FnOnce() -> bool) -> bool {
    want.map_or(true, |w| check() == w)
}

fn time_ok(window: &TimeWindow, read: impl FnOnce() -> Result<DateTime<Local>>) -> bool {
    if !window.is_set() {
        return true;
    }
    read().map(|t| window.contains(t)).unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// `Some(true)` for a zero-length file or a directory without entries,
/// `None` when the path is neither.
fn is_empty(path: &Path) -> Option<bool> {
    if path.is_file() {
        meta::file_size(path).ok().map(|len| len == 0)
    } else if path.is_dir() {
        fs::read_dir(path).ok().map(|mut d| d.next().is_none())
    } else {
        None
    }
}

/// Ownership and permission predicates.
#[derive(Debug, Clone, Default)]
pub struct OwnerFilter {
    pub user: Option<Owner>,
    pub group: Option<Owner>,
    /// Three octal digits as returned by [`platform::file_permissions`].
    pub permissions: Option<String>,
}

impl OwnerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: impl Into<Owner>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn group(mut self, group: impl Into<Owner>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn permissions(mut self, permissions: impl Into<String>) -> Self {
        self.permissions = Some(permissions.into());
        self
    }

    /// Keep the paths matching owner, group and permissions. Unknown user or
    /// group names are an error; unreadable paths are dropped.
    pub fn apply<I, P>(&self, paths: I) -> Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        #[cfg(unix)]
        let uid = self.user.as_ref().map(platform::permissions::resolve_uid).transpose()?;
        #[cfg(unix)]
        let gid = self.group.as_ref().map(platform::permissions::resolve_gid).transpose()?;
        #[cfg(not(unix))]
        {
            if self.user.is_some() || self.group.is_some() {
                return Err(ShellError::unsupported("filter by owner"));
            }
        }

        let mut kept = Vec::new();
        for path in paths.into_iter().map(Into::into) {
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };

            #[cfg(unix)]
            {
                use std::os::unix::fs::MetadataExt;
                if uid.is_some_and(|u| metadata.uid() != u) || gid.is_some_and(|g| metadata.gid() != g)
                {
                    continue;
                }
            }
            #[cfg(not(unix))]
            let _ = metadata;

            if let Some(wanted) = &self.permissions {
                match platform::file_permissions(&path) {
                    Ok(actual) if &actual == wanted => {}
                    _ => continue,
                }
            }
            kept.push(path);
        }
        Ok(kept)
    }
}

/// Keep paths whose text contains `needle`, or those that do not when `inverse`.
pub fn filter_by_substring<I, P>(paths: I, needle: &str, inverse: bool) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths
        .into_iter()
        .map(Into::into)
        .filter(|p| p.to_string_lossy().contains(needle) != inverse)
        .collect()
}

fn sort_by_key_fallible<K: Ord>(
    paths: Vec<PathBuf>,
    reverse: bool,
    key: impl Fn(&Path) -> Result<K>,
) -> Result<Vec<PathBuf>> {
    let mut keyed = paths
        .into_iter()
        .map(|p| Ok((key(&p)?, p)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|a, b| order(a.0.cmp(&b.0), reverse));
    Ok(keyed.into_iter().map(|(_, p)| p).collect())
}

fn order(ordering: Ordering, reverse: bool) -> Ordering {
    if reverse {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Oldest first (newest first with `reverse`).
pub fn sort_by_modified(paths: Vec<PathBuf>, reverse: bool) -> Result<Vec<PathBuf>> {
    sort_by_key_fallible(paths, reverse, |p| meta::modified_time(p))
}

/// Smallest first (largest first with `reverse`).
pub fn sort_by_size(paths: Vec<PathBuf>, reverse: bool) -> Result<Vec<PathBuf>> {
    sort_by_key_fallible(paths, reverse, |p| meta::file_size(p))
}

/// By file name, ignoring case.
pub fn sort_by_name(mut paths: Vec<PathBuf>, reverse: bool) -> Vec<PathBuf> {
    paths.sort_by_cached_key(|p| super::path::file_name(p).to_string_lossy().to_lowercase());
    if reverse {
        paths.reverse();
    }
    paths
}

/// By extension, ignoring case. Files without one sort first.
pub fn sort_by_extension(mut paths: Vec<PathBuf>, reverse: bool) -> Vec<PathBuf> {
    paths.sort_by_cached_key(|p| {
        p.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    if reverse {
        paths.reverse();
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Vec<PathBuf>) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("small.txt"), "a").unwrap();
        fs::write(root.join("big.log"), vec![b'x'; 2048]).unwrap();
        fs::write(root.join(".hidden"), "").unwrap();
        fs::create_dir(root.join("dir")).unwrap();
        let paths = vec![
            root.join("small.txt"),
            root.join("big.log"),
            root.join(".hidden"),
            root.join("dir"),
            root.join("ghost.txt"),
        ];
        (temp_dir, paths)
    }

    #[test]
    fn test_existing_and_kinds() {
        let (temp_dir, paths) = setup();
        let root = temp_dir.path();

        assert_eq!(FileFilter::new().existing(true).apply(paths.clone()).len(), 4);
        assert_eq!(
            FileFilter::new().existing(false).apply(paths.clone()),
            vec![root.join("ghost.txt")]
        );
        assert_eq!(
            FileFilter::new().dirs_only(true).apply(paths.clone()),
            vec![root.join("dir")]
        );
        assert_eq!(
            FileFilter::new()
                .existing(true)
                .files_only(false)
                .apply(paths.clone()),
            vec![root.join("dir")]
        );
        assert_eq!(
            FileFilter::new().dirs_only(false).apply(paths.clone()).len(),
            4
        );
        assert_eq!(
            FileFilter::new().kind("f".parse().unwrap()).apply(paths.clone()).len(),
            3
        );
        assert!("x".parse::<EntryKind>().is_err());
    }

    #[test]
    fn test_size_and_extension() {
        let (temp_dir, paths) = setup();
        let root = temp_dir.path();

        assert_eq!(
            FileFilter::new()
                .files_only(true)
                .size_greater_than(1024)
                .apply(paths.clone()),
            vec![root.join("big.log")]
        );
        // Directories and missing paths are not size-checked
        assert_eq!(
            FileFilter::new().size_less_than(10).apply(paths.clone()),
            vec![
                root.join("small.txt"),
                root.join(".hidden"),
                root.join("dir"),
                root.join("ghost.txt"),
            ]
        );
        assert_eq!(
            FileFilter::new()
                .existing(true)
                .extensions(&["txt"])
                .apply(paths.clone()),
            vec![root.join("small.txt")]
        );
    }

    #[test]
    fn test_hidden_and_empty() {
        let (temp_dir, paths) = setup();
        let root = temp_dir.path();

        assert_eq!(
            FileFilter::new().hidden(true).apply(paths.clone()),
            vec![root.join(".hidden")]
        );
        assert_eq!(
            FileFilter::new().empty(true).apply(paths.clone()),
            vec![root.join(".hidden"), root.join("dir")]
        );
    }

    #[test]
    fn test_time_window() {
        let (_temp_dir, paths) = setup();
        let hour_ago = Local::now() - ChronoDuration::hours(1);

        assert_eq!(
            FileFilter::new().modified_after(hour_ago).apply(paths.clone()).len(),
            4
        );
        assert!(FileFilter::new()
            .modified_before(hour_ago)
            .apply(paths)
            .is_empty());
    }

    #[test]
    fn test_depth() {
        let filter = FileFilter::new().max_depth(2);
        assert_eq!(
            filter.apply(["a/b", "a/b/c"]),
            vec![PathBuf::from("a/b")]
        );
        let filter = FileFilter::new().min_depth(3);
        assert_eq!(filter.apply(["a/b", "a/b/c"]), vec![PathBuf::from("a/b/c")]);
    }

    #[test]
    fn test_filter_by_substring() {
        let paths = ["x/report.txt", "x/data.csv", "y/report.csv"];
        assert_eq!(filter_by_substring(paths, "report", false).len(), 2);
        assert_eq!(
            filter_by_substring(paths, "report", true),
            vec![PathBuf::from("x/data.csv")]
        );
    }

    #[test]
    fn test_sorts() {
        let (temp_dir, _) = setup();
        let root = temp_dir.path();
        let files = vec![root.join("small.txt"), root.join("big.log")];

        assert_eq!(
            sort_by_size(files.clone(), false).unwrap(),
            vec![root.join("small.txt"), root.join("big.log")]
        );
        assert_eq!(
            sort_by_size(files.clone(), true).unwrap(),
            vec![root.join("big.log"), root.join("small.txt")]
        );
        assert_eq!(
            sort_by_name(vec!["b/Zed".into(), "a/alpha".into()], false),
            vec![PathBuf::from("a/alpha"), PathBuf::from("b/Zed")]
        );
        assert_eq!(
            sort_by_extension(files, false),
            vec![root.join("big.log"), root.join("small.txt")]
        );
        assert!(sort_by_modified(vec![root.join("ghost")], false).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_filter_permissions() {
        let (temp_dir, _) = setup();
        let path = temp_dir.path().join("small.txt");
        platform::chmod(&path, 0o640).unwrap();

        let kept = OwnerFilter::new().permissions("640").apply([&path]).unwrap();
        assert_eq!(kept, vec![path.clone()]);
        let kept = OwnerFilter::new().permissions("777").apply([&path]).unwrap();
        assert!(kept.is_empty());

        let uid = nix::unistd::getuid().as_raw();
        let kept = OwnerFilter::new().user(uid).apply([&path]).unwrap();
        assert_eq!(kept.len(), 1);
        assert!(OwnerFilter::new()
            .user("no-such-user-xyz")
            .apply([&path])
            .is_err());
    }
}
