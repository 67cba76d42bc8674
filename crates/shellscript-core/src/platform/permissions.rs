//! Platform-specific file permission handling.
//!
//! Octal permission strings, chmod/chown, and the access checks used by
//! `FileFilter`.

use crate::error::{Result, ShellError};
use std::path::Path;
use tracing::debug;

/// A file owner given either by name or by numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Name(String),
    Id(u32),
}

impl From<&str> for Owner {
    fn from(name: &str) -> Self {
        Owner::Name(name.to_string())
    }
}

impl From<String> for Owner {
    fn from(name: String) -> Self {
        Owner::Name(name)
    }
}

impl From<u32> for Owner {
    fn from(id: u32) -> Self {
        Owner::Id(id)
    }
}

/// Permission bits of a path as three octal digits, e.g. `"755"`.
///
/// # Platform Behavior
/// - **Linux/macOS**: the low nine mode bits
/// - **Windows**: `"555"` for read-only files, `"777"` otherwise
pub fn file_permissions(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let metadata =
        std::fs::metadata(path).map_err(|e| ShellError::io_with_path(e, path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(format!("{:03o}", metadata.permissions().mode() & 0o777))
    }

    #[cfg(not(unix))]
    {
        if metadata.permissions().readonly() {
            Ok("555".to_string())
        } else {
            Ok("777".to_string())
        }
    }
}

/// Change the permission bits of a file or directory.
///
/// On Windows only the read-only flag can be expressed: it is set when the
/// mode has no owner write bit.
pub fn chmod(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    let path = path.as_ref();
    let metadata =
        std::fs::metadata(path).map_err(|e| ShellError::io_with_path(e, path))?;
    let mut permissions = metadata.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(mode);
    }

    #[cfg(not(unix))]
    {
        permissions.set_readonly(mode & 0o200 == 0);
    }

    std::fs::set_permissions(path, permissions).map_err(|e| ShellError::io_with_path(e, path))?;
    debug!("chmod {:o} {}", mode, path.display());
    Ok(())
}

/// Change the owner and/or group of a path. `None` leaves that part unchanged.
///
/// Names are resolved through the system user and group databases. Unix only.
pub fn chown(path: impl AsRef<Path>, user: Option<Owner>, group: Option<Owner>) -> Result<()> {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        use nix::unistd::{Gid, Uid};

        let uid = user.map(|u| resolve_uid(&u)).transpose()?.map(Uid::from_raw);
        let gid = group.map(|g| resolve_gid(&g)).transpose()?.map(Gid::from_raw);

        nix::unistd::chown(path, uid, gid).map_err(|e| {
            ShellError::io_with_path(std::io::Error::from_raw_os_error(e as i32), path)
        })?;
        debug!("chown {:?}:{:?} {}", uid, gid, path.display());
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = (path, user, group);
        Err(ShellError::unsupported("chown"))
    }
}

/// Resolve an [`Owner`] to a numeric user id.
#[cfg(unix)]
pub fn resolve_uid(owner: &Owner) -> Result<u32> {
    match owner {
        Owner::Id(id) => Ok(*id),
        Owner::Name(name) => nix::unistd::User::from_name(name)
            .ok()
            .flatten()
            .map(|u| u.uid.as_raw())
            .ok_or_else(|| ShellError::UnknownUser(name.clone())),
    }
}

/// Resolve an [`Owner`] to a numeric group id.
#[cfg(unix)]
pub fn resolve_gid(owner: &Owner) -> Result<u32> {
    match owner {
        Owner::Id(id) => Ok(*id),
        Owner::Name(name) => nix::unistd::Group::from_name(name)
            .ok()
            .flatten()
            .map(|g| g.gid.as_raw())
            .ok_or_else(|| ShellError::UnknownGroup(name.clone())),
    }
}

/// Make a file executable (mode 0o755). No-op on Windows.
pub fn set_executable(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        chmod(path, 0o755)?;
    }

    #[cfg(windows)]
    {
        debug!("Skipping executable bit on Windows for: {}", path.display());
    }

    Ok(())
}

/// Check if a file has executable permissions.
///
/// # Platform Behavior
/// - **Linux/macOS**: the current user may execute it (`access(X_OK)`)
/// - **Windows**: common executable extensions (.exe, .bat, .cmd, .ps1, .com)
pub fn is_executable(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        access(path, nix::unistd::AccessFlags::X_OK)
    }

    #[cfg(not(unix))]
    {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                matches!(ext.as_str(), "exe" | "bat" | "cmd" | "ps1" | "com")
            })
            .unwrap_or(false)
    }
}

/// Check if the current user may read `path`.
pub fn is_readable(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        access(path, nix::unistd::AccessFlags::R_OK)
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}

/// Check if the current user may write `path`.
pub fn is_writable(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        access(path, nix::unistd::AccessFlags::W_OK)
    }

    #[cfg(not(unix))]
    {
        std::fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }
}

#[cfg(unix)]
fn access(path: &Path, mode: nix::unistd::AccessFlags) -> bool {
    nix::unistd::access(path, mode).is_ok()
}
