//! File size and timestamp helpers.

use crate::error::{Result, ShellError};
use chrono::{DateTime, Local, TimeZone};
use std::fs::{self, Metadata};
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

fn metadata(path: &Path) -> Result<Metadata> {
    fs::metadata(path).map_err(|e| ShellError::io_with_path(e, path))
}

/// Size of a file in bytes.
pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    Ok(metadata(path.as_ref())?.len())
}

/// Sum of the sizes of all given files.
pub fn total_size<I, P>(paths: I) -> Result<u64>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .try_fold(0u64, |acc, p| Ok(acc + file_size(p)?))
}

/// Last modification time, in local time.
pub fn modified_time(path: impl AsRef<Path>) -> Result<DateTime<Local>> {
    let path = path.as_ref();
    let time = metadata(path)?
        .modified()
        .map_err(|e| ShellError::io_with_path(e, path))?;
    Ok(time.into())
}

/// Last access time, in local time.
pub fn accessed_time(path: impl AsRef<Path>) -> Result<DateTime<Local>> {
    let path = path.as_ref();
    let time = metadata(path)?
        .accessed()
        .map_err(|e| ShellError::io_with_path(e, path))?;
    Ok(time.into())
}

/// Status change time on Unix (`st_ctime`), creation time elsewhere.
pub fn changed_time(path: impl AsRef<Path>) -> Result<DateTime<Local>> {
    let path = path.as_ref();
    let meta = metadata(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let nanos = u32::try_from(meta.ctime_nsec()).unwrap_or(0);
        Local
            .timestamp_opt(meta.ctime(), nanos)
            .single()
            .ok_or_else(|| ShellError::Other(format!("Invalid ctime on {}", path.display())))
    }

    #[cfg(not(unix))]
    {
        let time = meta
            .created()
            .map_err(|e| ShellError::io_with_path(e, path))?;
        Ok(time.into())
    }
}

/// Creation (birth) time when the OS records one.
///
/// Falls back to the status change time on Unix file systems without birth
/// times, which is what `ls -lc` would show.
pub fn created_time(path: impl AsRef<Path>) -> Result<DateTime<Local>> {
    let path = path.as_ref();
    match metadata(path)?.created() {
        Ok(time) => Ok(time.into()),
        Err(e) => {
            debug!("No birth time for {}: {}", path.display(), e);
            changed_time(path)
        }
    }
}

/// Set the modification time of a file. Directories are rejected.
pub fn set_modified_time<Tz: TimeZone>(path: impl AsRef<Path>, time: DateTime<Tz>) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ShellError::NotAFile(path.to_path_buf()));
    }
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| ShellError::io_with_path(e, path))?;
    file.set_modified(SystemTime::from(time))
        .map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("Set modification time of {}", path.display());
    Ok(())
}

/// Setting the creation time is not supported by the standard file APIs on
/// any platform this crate targets, so this always fails with `Unsupported`
/// after validating the path.
pub fn set_created_time<Tz: TimeZone>(path: impl AsRef<Path>, _time: DateTime<Tz>) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ShellError::NotAFile(path.to_path_buf()));
    }
    Err(ShellError::unsupported("set_created_time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use tempfile::TempDir;

    #[test]
    fn test_file_size_and_total() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.bin");
        let b = temp_dir.path().join("b.bin");
        fs::write(&a, vec![0u8; 10]).unwrap();
        fs::write(&b, vec![0u8; 32]).unwrap();

        assert_eq!(file_size(&a).unwrap(), 10);
        assert_eq!(total_size([&a, &b]).unwrap(), 42);
        assert!(total_size([temp_dir.path().join("missing")]).is_err());
    }

    #[test]
    fn test_set_and_get_modified_time() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stamp.txt");
        fs::write(&path, "x").unwrap();

        let when = Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2021, 6, 15)
                    .unwrap()
                    .and_hms_opt(10, 30, 0)
                    .unwrap(),
            )
            .single()
            .unwrap();
        set_modified_time(&path, when).unwrap();

        let got = modified_time(&path).unwrap();
        assert!((got - when).abs() < ChronoDuration::seconds(1));
    }

    #[test]
    fn test_set_modified_time_rejects_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            set_modified_time(temp_dir.path(), Local::now()),
            Err(ShellError::NotAFile(_))
        ));
    }

    #[test]
    fn test_created_time_is_recent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("new.txt");
        fs::write(&path, "x").unwrap();

        let created = created_time(&path).unwrap();
        assert!(Local::now() - created < ChronoDuration::minutes(5));
        assert!(accessed_time(&path).is_ok());
    }

    #[test]
    fn test_set_created_time_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("new.txt");
        fs::write(&path, "x").unwrap();
        assert!(matches!(
            set_created_time(&path, Local::now()),
            Err(ShellError::Unsupported { .. })
        ));
    }
}
