//! Process table inspection backed by `sysinfo`.

use crate::error::{Result, ShellError};
use crate::platform;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users};
use tracing::debug;

/// Attribute names accepted by [`to_records`].
pub const PROCESS_ATTRS: [&str; 12] = [
    "pid",
    "ppid",
    "name",
    "exe",
    "cmdline",
    "cwd",
    "username",
    "status",
    "cpu_percent",
    "memory_rss",
    "memory_vms",
    "create_time",
];

const WINDOWS_SYSTEM_USERS: [&str; 3] = ["SYSTEM", "LOCAL SERVICE", "NETWORK SERVICE"];

/// Copy of one process's state at the time of the scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub ppid: Option<u32>,
    pub name: String,
    pub exe: Option<PathBuf>,
    pub cmdline: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub username: Option<String>,
    pub status: String,
    /// CPU usage since the previous refresh; 0 on a first scan.
    pub cpu_percent: f32,
    /// Resident memory in bytes.
    pub memory_rss: u64,
    /// Virtual memory in bytes.
    pub memory_vms: u64,
    /// Start time, seconds since the Unix epoch.
    pub create_time: u64,
    /// Seconds since start.
    pub run_time: u64,
}

impl ProcessSnapshot {
    pub(crate) fn from_process(process: &Process, users: &Users) -> Self {
        let username = process
            .user_id()
            .and_then(|uid| users.get_user_by_id(uid))
            .map(|user| user.name().to_string());

        Self {
            pid: process.pid().as_u32(),
            ppid: process.parent().map(|p| p.as_u32()),
            name: process.name().to_string_lossy().into_owned(),
            exe: process.exe().map(PathBuf::from),
            cmdline: process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
            cwd: process.cwd().map(PathBuf::from),
            username,
            status: process.status().to_string(),
            cpu_percent: process.cpu_usage(),
            memory_rss: process.memory(),
            memory_vms: process.virtual_memory(),
            create_time: process.start_time(),
            run_time: process.run_time(),
        }
    }

    /// Kernel threads and other processes with no owner or command line.
    pub fn is_core(&self) -> bool {
        self.username.as_deref().map_or(true, str::is_empty) || self.cmdline.is_empty()
    }

    /// Processes owned by `root`, or by a Windows service account.
    pub fn is_system(&self) -> bool {
        let Some(user) = self.username.as_deref() else {
            return false;
        };
        if platform::is_windows() {
            let account = user.rsplit('\\').next().unwrap_or(user).to_uppercase();
            WINDOWS_SYSTEM_USERS.contains(&account.as_str())
        } else {
            user == "root"
        }
    }
}

/// Which processes [`list_processes`] returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessFilter {
    pub skip_system: bool,
    pub skip_core: bool,
    /// Only system processes; overrides `skip_system`.
    pub only_system: bool,
}

impl ProcessFilter {
    /// Ordinary user processes: no system, no core.
    pub fn user_only() -> Self {
        Self {
            skip_system: true,
            skip_core: true,
            only_system: false,
        }
    }

    fn accepts(&self, snapshot: &ProcessSnapshot) -> bool {
        if self.skip_core && snapshot.is_core() {
            return false;
        }
        if self.only_system {
            return snapshot.is_system();
        }
        !(self.skip_system && snapshot.is_system())
    }
}

fn full_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::new()
        .with_cpu()
        .with_memory()
        .with_user(UpdateKind::OnlyIfNotSet)
        .with_cmd(UpdateKind::OnlyIfNotSet)
        .with_exe(UpdateKind::OnlyIfNotSet)
        .with_cwd(UpdateKind::OnlyIfNotSet)
}

pub(crate) fn refresh_all_processes(system: &mut System) {
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, full_refresh_kind());
}

fn scan() -> System {
    let mut system = System::new();
    refresh_all_processes(&mut system);
    system
}

fn strip_exe(name: &str) -> &str {
    match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".exe") => {
            &name[..cut]
        }
        _ => name,
    }
}

/// True if a process with this name exists. Case-insensitive.
///
/// `ignore_exe_extension` defaults to true on Windows, where `notepad`
/// then matches `notepad.exe`.
pub fn proc_present(name: &str, ignore_exe_extension: Option<bool>) -> bool {
    let ignore_ext = ignore_exe_extension.unwrap_or_else(platform::is_windows);
    let normalize = |n: &str| {
        let n = if ignore_ext { strip_exe(n) } else { n };
        n.to_lowercase()
    };
    let wanted = normalize(name);

    let mut system = System::new();
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::new());
    let found = system
        .processes()
        .values()
        .any(|p| normalize(&p.name().to_string_lossy()) == wanted);
    debug!("proc_present({}) = {}", name, found);
    found
}

/// Snapshot of every process accepted by `filter`, ordered by PID.
pub fn list_processes(filter: &ProcessFilter) -> Vec<ProcessSnapshot> {
    let system = scan();
    let users = Users::new_with_refreshed_list();
    let mut list: Vec<ProcessSnapshot> = system
        .processes()
        .values()
        .map(|p| ProcessSnapshot::from_process(p, &users))
        .filter(|s| filter.accepts(s))
        .collect();
    list.sort_by_key(|s| s.pid);
    list
}

pub fn pid_list(processes: &[ProcessSnapshot]) -> Vec<u32> {
    processes.iter().map(|p| p.pid).collect()
}

pub fn name_list(processes: &[ProcessSnapshot]) -> Vec<String> {
    processes.iter().map(|p| p.name.clone()).collect()
}

/// JSON objects holding only the requested attributes.
///
/// Valid names are listed in [`PROCESS_ATTRS`].
pub fn to_records(
    processes: &[ProcessSnapshot],
    attrs: &[&str],
) -> Result<Vec<serde_json::Value>> {
    if let Some(bad) = attrs.iter().find(|a| !PROCESS_ATTRS.contains(*a)) {
        return Err(ShellError::invalid(
            "attrs",
            format!("unknown process attribute {:?}", bad),
        ));
    }

    processes
        .iter()
        .map(|process| {
            let serde_json::Value::Object(mut all) = serde_json::to_value(process)? else {
                return Err(ShellError::Other("process snapshot is not an object".into()));
            };
            let mut record = serde_json::Map::new();
            for attr in attrs {
                let value = all.remove(*attr).unwrap_or(serde_json::Value::Null);
                record.insert((*attr).to_string(), value);
            }
            Ok(serde_json::Value::Object(record))
        })
        .collect()
}

/// Snapshot of one process.
pub fn process_info(pid: u32) -> Result<ProcessSnapshot> {
    let mut system = System::new();
    let target = Pid::from_u32(pid);
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[target]),
        true,
        full_refresh_kind(),
    );
    let process = system
        .process(target)
        .ok_or(ShellError::ProcessNotFound { pid })?;
    let users = Users::new_with_refreshed_list();
    Ok(ProcessSnapshot::from_process(process, &users))
}

/// Stop a process by PID: SIGTERM, then SIGKILL after `grace`.
///
/// Returns `true` when the process is gone afterwards.
pub fn kill_process(pid: u32, grace: Duration) -> Result<bool> {
    if !platform::is_process_alive(pid) {
        return Err(ShellError::ProcessNotFound { pid });
    }
    platform::terminate_process(pid, grace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, user: Option<&str>, cmdline: &[&str]) -> ProcessSnapshot {
        ProcessSnapshot {
            pid: 1,
            ppid: None,
            name: name.to_string(),
            exe: None,
            cmdline: cmdline.iter().map(|s| s.to_string()).collect(),
            cwd: None,
            username: user.map(str::to_string),
            status: "Run".to_string(),
            cpu_percent: 0.0,
            memory_rss: 0,
            memory_vms: 0,
            create_time: 0,
            run_time: 0,
        }
    }

    #[test]
    fn test_strip_exe() {
        assert_eq!(strip_exe("notepad.exe"), "notepad");
        assert_eq!(strip_exe("NOTEPAD.EXE"), "NOTEPAD");
        assert_eq!(strip_exe("exe"), "exe");
        assert_eq!(strip_exe("bash"), "bash");
    }

    #[test]
    fn test_core_and_system_classification() {
        let kthread = snapshot("kworker/0:1", Some("root"), &[]);
        assert!(kthread.is_core());

        let orphan = snapshot("x", None, &["x"]);
        assert!(orphan.is_core());
        assert!(!orphan.is_system());

        let user = snapshot("vim", Some("alice"), &["vim", "notes.md"]);
        assert!(!user.is_core());
        assert!(!user.is_system());

        if !platform::is_windows() {
            let daemon = snapshot("sshd", Some("root"), &["/usr/sbin/sshd"]);
            assert!(daemon.is_system());
            assert!(!ProcessFilter::user_only().accepts(&daemon));
            assert!(ProcessFilter {
                only_system: true,
                skip_system: true,
                ..Default::default()
            }
            .accepts(&daemon));
        }
    }

    #[test]
    fn test_to_records_selects_attrs() {
        let list = vec![snapshot("vim", Some("alice"), &["vim"])];
        let records = to_records(&list, &["name", "pid"]).unwrap();
        assert_eq!(records[0], serde_json::json!({"name": "vim", "pid": 1}));

        assert!(matches!(
            to_records(&list, &["bogus"]),
            Err(ShellError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_lists() {
        let list = vec![
            snapshot("a", Some("u"), &["a"]),
            snapshot("b", Some("u"), &["b"]),
        ];
        assert_eq!(pid_list(&list), vec![1, 1]);
        assert_eq!(name_list(&list), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_current_process_is_listed() {
        let me = std::process::id();
        let all = list_processes(&ProcessFilter::default());
        assert!(pid_list(&all).contains(&me));

        let info = process_info(me).unwrap();
        assert_eq!(info.pid, me);
        assert!(proc_present(&info.name, None));
    }

    #[test]
    fn test_process_info_missing() {
        assert!(matches!(
            process_info(4_000_000_000),
            Err(ShellError::ProcessNotFound { .. })
        ));
        assert!(matches!(
            kill_process(4_000_000_000, Duration::from_millis(10)),
            Err(ShellError::ProcessNotFound { .. })
        ));
    }

    #[test]
    fn test_kill_pid_zero_is_not_found() {
        assert!(matches!(
            kill_process(0, Duration::from_millis(10)),
            Err(ShellError::ProcessNotFound { pid: 0 })
        ));
    }
}
