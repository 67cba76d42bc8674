//! Operating system identification.

use std::path::PathBuf;
use sysinfo::System;
use tracing::debug;

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Human readable operating system name.
///
/// - **Windows**: "Windows 10", "Windows 11", ... derived from the build number
/// - **Linux**: the distribution's `PRETTY_NAME`
/// - **Other**: whatever `sysinfo` reports
pub fn os_name() -> String {
    if super::is_windows() {
        let version = System::kernel_version().unwrap_or_default();
        let release = System::os_version().unwrap_or_default();
        windows_name(&release, &version)
    } else if super::is_linux() {
        linux_distribution_name()
    } else {
        System::long_os_version().unwrap_or_else(|| "Unknown operating system.".to_string())
    }
}

/// Operating system version: the Windows version string or the Linux kernel release.
pub fn os_version() -> String {
    if super::is_windows() {
        System::kernel_version()
            .or_else(System::os_version)
            .unwrap_or_else(|| "Unsupported operating system.".to_string())
    } else if super::is_linux() {
        System::kernel_version().unwrap_or_else(|| "Unsupported operating system.".to_string())
    } else {
        System::os_version().unwrap_or_else(|| "Unsupported operating system.".to_string())
    }
}

/// File name of the running program (`argv[0]` without its directory).
pub fn current_script_name() -> PathBuf {
    std::env::args_os()
        .next()
        .map(PathBuf::from)
        .and_then(|p| p.file_name().map(PathBuf::from))
        .unwrap_or_default()
}

fn linux_distribution_name() -> String {
    for path in OS_RELEASE_PATHS {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                if let Some(name) = pretty_name(&text) {
                    return name;
                }
            }
            Err(e) => debug!("Cannot read {}: {}", path, e),
        }
    }
    "Linux Distribution Name Unknown".to_string()
}

/// Extract `PRETTY_NAME` from os-release text, unquoted.
pub(crate) fn pretty_name(os_release: &str) -> Option<String> {
    os_release.lines().find_map(|line| {
        let value = line.trim().strip_prefix("PRETTY_NAME=")?;
        let value = value.trim().trim_matches('"').trim_matches('\'').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Map a Windows release and version string to a marketing name.
///
/// Windows 10 and 11 both report release "10"; build 22000 and later is 11.
pub(crate) fn windows_name(release: &str, version: &str) -> String {
    let release = release.trim();
    if let Some(build) = windows_build_number(version) {
        return if build >= 22000 {
            "Windows 11".to_string()
        } else {
            "Windows 10".to_string()
        };
    }
    if ["XP", "Vista", "7", "8", "10"].contains(&release) {
        return format!("Windows {}", release);
    }
    format!("Windows (Unknown Version: {})", version)
}

fn windows_build_number(version: &str) -> Option<u32> {
    let rest = &version[version.find("10.0.")? + "10.0.".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
