//! Platform abstraction layer for cross-platform compatibility.
//!
//! This module centralizes all platform-specific code to make it easy to find,
//! maintain, and extend. All `#[cfg]` blocks for OS-specific behavior should
//! live in this module rather than scattered throughout the codebase.
//!
//! # Architecture
//!
//! - `os` - Operating system name and version
//! - `permissions` - Permission bits, ownership, access checks
//! - `process` - Process liveness and termination by PID
//!
//! # Supported Platforms
//!
//! - **Linux**: Full support
//! - **macOS**: Full support except `/etc/os-release` naming
//! - **Windows**: Everything except `chown`

pub mod os;
pub mod permissions;
pub mod process;

pub use os::{current_script_name, os_name, os_version};
pub use permissions::{
    chmod, chown, file_permissions, is_executable, is_readable, is_writable, set_executable,
    Owner,
};
pub use process::{is_process_alive, terminate_process, terminate_process_tree};

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    {
        "unknown"
    }
}

/// Check if the operating system is Windows.
pub fn is_windows() -> bool {
    cfg!(target_os = "windows")
}

/// Check if the operating system is Linux.
pub fn is_linux() -> bool {
    cfg!(target_os = "linux")
}
