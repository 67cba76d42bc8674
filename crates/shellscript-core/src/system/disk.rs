//! Disk usage for the file system holding a path.

use crate::error::{Result, ShellError};
use serde::Serialize;
use std::path::Path;
use sysinfo::{Disk, Disks};

/// Space on one disk, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Used space in percent, one decimal.
    pub percent: f32,
}

impl DiskUsage {
    fn from_disk(disk: &Disk) -> Self {
        let total = disk.total_space();
        let free = disk.available_space();
        let used = total.saturating_sub(free);
        let percent = if total > 0 {
            (used as f32 / total as f32) * 100.0
        } else {
            0.0
        };
        Self {
            total,
            used,
            free,
            percent: (percent * 10.0).round() / 10.0,
        }
    }
}

/// Usage of the disk whose mount point is the longest prefix of `path`.
pub fn disk_usage(path: impl AsRef<Path>) -> Result<DiskUsage> {
    let path = path.as_ref();
    let resolved = path.canonicalize().map_err(|e| ShellError::io_with_path(e, path))?;

    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| resolved.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().components().count())
        .map(DiskUsage::from_disk)
        .ok_or_else(|| ShellError::SystemQuery {
            message: format!("No disk found for {}", path.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_usage_for_temp_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        // Containers may expose no disk list at all
        if let Ok(usage) = disk_usage(temp_dir.path()) {
            assert!(usage.used <= usage.total);
            assert!((0.0..=100.0).contains(&usage.percent));
        }
    }

    #[test]
    fn test_disk_usage_missing_path() {
        assert!(matches!(
            disk_usage("/definitely/not/here"),
            Err(ShellError::FileNotFound(_))
        ));
    }
}
