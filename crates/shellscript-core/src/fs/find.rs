//! Glob search below a directory.

use super::path::expand_user;
use crate::error::{Result, ShellError};
use std::path::{Path, PathBuf};
use tracing::debug;

fn glob_paths(dir: &Path, mask: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let dir = expand_user(dir);
    if !dir.exists() {
        return Err(ShellError::FileNotFound(dir));
    }
    if !dir.is_dir() {
        return Err(ShellError::NotADirectory(dir));
    }

    let dir_str = dir
        .to_str()
        .ok_or_else(|| ShellError::invalid("dir", format!("{:?} is not valid UTF-8", dir)))?;
    let base = glob::Pattern::escape(dir_str);
    let pattern = if recursive {
        format!("{}/**/{}", base, mask)
    } else {
        format!("{}/{}", base, mask)
    };
    debug!("Searching {}", pattern);

    let paths = glob::glob(&pattern).map_err(|e| ShellError::invalid("mask", e.to_string()))?;
    let mut found: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .collect();
    found.sort();
    found.dedup();
    Ok(found)
}

/// Files and directories below `dir` whose name matches the glob `mask`,
/// sorted. With `recursive`, every depth is searched.
pub fn find(dir: impl AsRef<Path>, mask: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    glob_paths(dir.as_ref(), mask, recursive)
}

/// Like [`find`], but keeps only directories.
pub fn find_dirs(dir: impl AsRef<Path>, mask: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    Ok(glob_paths(dir.as_ref(), mask, recursive)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub").join("deep")).unwrap();
        fs::create_dir(root.join("logs.d")).unwrap();
        fs::write(root.join("a.txt"), "").unwrap();
        fs::write(root.join("b.log"), "").unwrap();
        fs::write(root.join("sub").join("c.txt"), "").unwrap();
        fs::write(root.join("sub").join("deep").join("d.txt"), "").unwrap();
        temp_dir
    }

    #[test]
    fn test_find_flat() {
        let temp_dir = tree();
        let root = temp_dir.path();
        assert_eq!(find(root, "*.txt", false).unwrap(), vec![root.join("a.txt")]);
    }

    #[test]
    fn test_find_recursive_sorted() {
        let temp_dir = tree();
        let root = temp_dir.path();
        assert_eq!(
            find(root, "*.txt", true).unwrap(),
            vec![
                root.join("a.txt"),
                root.join("sub").join("c.txt"),
                root.join("sub").join("deep").join("d.txt"),
            ]
        );
    }

    #[test]
    fn test_find_dirs() {
        let temp_dir = tree();
        let root = temp_dir.path();
        assert_eq!(
            find_dirs(root, "*", false).unwrap(),
            vec![root.join("logs.d"), root.join("sub")]
        );
        assert_eq!(
            find_dirs(root, "deep", true).unwrap(),
            vec![root.join("sub").join("deep")]
        );
    }

    #[test]
    fn test_find_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            find(temp_dir.path().join("nope"), "*", false),
            Err(ShellError::FileNotFound(_))
        ));
    }
}
