//! Platform-specific process management.
//!
//! Cross-platform liveness checks and termination for arbitrary PIDs. Child
//! processes spawned by this crate are normally stopped through their
//! `ProcessHandle`; these functions cover PIDs we only know by number.

use crate::error::{Result, ShellError};
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// Check if a process with the given PID is alive.
///
/// # Platform Behavior
/// - **Linux/macOS**: `kill(pid, 0)`; `EPERM` still means the process exists
/// - **Windows**: `OpenProcess` with `PROCESS_QUERY_LIMITED_INFORMATION`
///
/// PID 0 is never reported alive: on Unix it addresses the caller's own
/// process group.
pub fn is_process_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }

    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid as NixPid;

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        match kill(NixPid::from_raw(raw), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    #[cfg(windows)]
    {
        windows_process_alive(pid)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
        system.process(Pid::from_u32(pid)).is_some()
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
fn windows_process_alive(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    // SAFETY: OpenProcess has no preconditions beyond valid flag values; the
    // returned handle is closed before leaving the block.
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle.is_null() {
            false
        } else {
            CloseHandle(handle);
            true
        }
    }
}

/// Terminate a process gracefully, then forcefully if needed.
///
/// # Platform Behavior
/// - **Linux/macOS**: Sends SIGTERM, waits up to `grace`, then SIGKILL
/// - **Windows**: `taskkill /PID {pid} /F`
///
/// Returns `true` if the process is gone afterwards (or was never running).
/// PID 0 is rejected with `ProcessNotFound`.
pub fn terminate_process(pid: u32, grace: Duration) -> Result<bool> {
    if pid == 0 {
        return Err(ShellError::ProcessNotFound { pid });
    }
    if !is_process_alive(pid) {
        debug!("Process {} is not running", pid);
        return Ok(true);
    }

    #[cfg(unix)]
    {
        terminate_process_unix(pid, grace)
    }

    #[cfg(windows)]
    {
        let _ = grace;
        terminate_process_windows(pid, false)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = grace;
        Err(ShellError::unsupported("process termination"))
    }
}

#[cfg(unix)]
fn terminate_process_unix(pid: u32, grace: Duration) -> Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::sys::wait::{waitpid, WaitPidFlag};
    use nix::unistd::Pid as NixPid;
    use std::thread::sleep;

    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return Err(ShellError::ProcessNotFound { pid }),
    };
    let nix_pid = NixPid::from_raw(raw);

    debug!("Sending SIGTERM to process {}", pid);
    match kill(nix_pid, Signal::SIGTERM) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(true),
        Err(Errno::EPERM) => return Err(ShellError::ProcessAccessDenied { pid }),
        Err(e) => warn!("Failed to send SIGTERM to {}: {}", pid, e),
    }

    let wait_interval = Duration::from_millis(100);
    let iterations = (grace.as_millis() / 100).max(1);

    for _ in 0..iterations {
        sleep(wait_interval);
        // Reap if it is our own child; ECHILD otherwise, which is fine
        let _ = waitpid(nix_pid, Some(WaitPidFlag::WNOHANG));
        if !is_process_alive(pid) {
            debug!("Process {} terminated gracefully", pid);
            return Ok(true);
        }
    }

    debug!("Process {} still running, sending SIGKILL", pid);
    match kill(nix_pid, Signal::SIGKILL) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(true),
        Err(e) => {
            return Err(ShellError::Other(format!(
                "Failed to kill process {}: {}",
                pid, e
            )))
        }
    }

    sleep(Duration::from_millis(100));
    let _ = waitpid(nix_pid, Some(WaitPidFlag::WNOHANG));

    Ok(!is_process_alive(pid))
}

#[cfg(windows)]
fn terminate_process_windows(pid: u32, tree: bool) -> Result<bool> {
    use std::process::Command;

    debug!("Terminating process {} with taskkill", pid);

    let pid_str = pid.to_string();
    let mut args = vec!["/PID", pid_str.as_str(), "/F"];
    if tree {
        args.push("/T");
    }

    let output = Command::new("taskkill")
        .args(&args)
        .output()
        .map_err(|e| ShellError::Spawn {
            command: "taskkill".to_string(),
            source: e,
        })?;

    if output.status.success() {
        return Ok(true);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("not found") || stderr.contains("not running") {
        Ok(true)
    } else {
        warn!("taskkill failed for {}: {}", pid, stderr);
        Ok(false)
    }
}

/// Terminate a process together with all of its descendants.
///
/// Descendants are collected from a fresh process table snapshot and stopped
/// children before parents, so none is re-parented mid-way.
pub fn terminate_process_tree(pid: u32, grace: Duration) -> Result<bool> {
    if pid == 0 {
        return Err(ShellError::ProcessNotFound { pid });
    }

    #[cfg(windows)]
    {
        let _ = grace;
        terminate_process_windows(pid, true)
    }

    #[cfg(not(windows))]
    {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new(),
        );

        let mut descendants = Vec::new();
        collect_descendants(&system, Pid::from_u32(pid), &mut descendants);

        for child in descendants.iter().rev() {
            if let Err(e) = terminate_process(*child, grace) {
                warn!("Failed to terminate child {} of {}: {}", child, pid, e);
            }
        }

        terminate_process(pid, grace)
    }
}

/// Every descendant of `parent`, each listed after its own parent.
pub(crate) fn collect_descendants(system: &System, parent: Pid, out: &mut Vec<u32>) {
    let mut queue = vec![parent];
    while let Some(current) = queue.pop() {
        for (child_pid, process) in system.processes() {
            if process.parent() == Some(current) && *child_pid != parent {
                let raw = child_pid.as_u32();
                if !out.contains(&raw) {
                    out.push(raw);
                    queue.push(*child_pid);
                }
            }
        }
    }
}
