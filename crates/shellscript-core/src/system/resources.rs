//! System and process resource monitoring.
//!
//! [`SystemMonitor`] keeps one `sysinfo::System` and refreshes it at most
//! once per cache TTL, so repeated queries in a loop stay cheap.

use super::disk::{disk_usage, DiskUsage};
use crate::config::ProcessConfig;
use crate::error::{Result, ShellError};
use crate::platform::process::collect_descendants;
use serde::Serialize;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

/// System-wide resource usage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    /// CPU usage percentage (0-100).
    pub cpu_usage: f32,
    /// Logical CPU count.
    pub cpu_count: usize,
    pub ram_total: u64,
    pub ram_used: u64,
    pub ram_available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    /// Seconds since boot.
    pub uptime: u64,
    /// Boot time, seconds since the Unix epoch.
    pub boot_time: u64,
    /// 1, 5 and 15 minute load averages (zeros on Windows).
    pub load_average: [f64; 3],
}

/// Per-process resource usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessResources {
    /// CPU usage percentage (0-100+, can exceed 100 on multi-core).
    pub cpu: f32,
    /// Resident memory in bytes.
    pub memory: u64,
    /// Number of processes aggregated (1 + descendants).
    pub process_count: usize,
}

/// Cached view of the system used for repeated resource queries.
pub struct SystemMonitor {
    cache_ttl: Duration,
    system: RwLock<System>,
    last_refresh: RwLock<Option<Instant>>,
}

impl SystemMonitor {
    /// Create a monitor whose data is refreshed at most every `cache_ttl`.
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            cache_ttl,
            system: RwLock::new(System::new()),
            last_refresh: RwLock::new(None),
        }
    }

    /// Snapshot of CPU, memory, swap, uptime and load.
    pub fn system_snapshot(&self) -> SystemSnapshot {
        let system = self.fresh_system();
        let load = System::load_average();

        SystemSnapshot {
            cpu_usage: system.global_cpu_usage(),
            cpu_count: system.cpus().len(),
            ram_total: system.total_memory(),
            ram_used: system.used_memory(),
            ram_available: system.available_memory(),
            swap_total: system.total_swap(),
            swap_used: system.used_swap(),
            uptime: System::uptime(),
            boot_time: System::boot_time(),
            load_average: [load.one, load.five, load.fifteen],
        }
    }

    /// CPU and memory of `pid`, optionally summed over all its descendants.
    pub fn process_resources(&self, pid: u32, include_children: bool) -> Result<ProcessResources> {
        let system = self.fresh_system();
        let root = Pid::from_u32(pid);
        if system.process(root).is_none() {
            return Err(ShellError::ProcessNotFound { pid });
        }

        let mut pids = vec![pid];
        if include_children {
            collect_descendants(&system, root, &mut pids);
        }

        let mut resources = ProcessResources::default();
        for process in pids.iter().filter_map(|p| system.process(Pid::from_u32(*p))) {
            resources.cpu += process.cpu_usage();
            resources.memory += process.memory();
            resources.process_count += 1;
        }
        resources.cpu = (resources.cpu * 10.0).round() / 10.0;
        Ok(resources)
    }

    /// Every descendant of `pid`.
    pub fn child_pids(&self, pid: u32) -> Vec<u32> {
        let system = self.fresh_system();
        let mut children = Vec::new();
        collect_descendants(&system, Pid::from_u32(pid), &mut children);
        children
    }

    pub fn process_exists(&self, pid: u32) -> bool {
        self.fresh_system().process(Pid::from_u32(pid)).is_some()
    }

    /// Usage of the disk holding `path`.
    pub fn disk_usage(&self, path: impl AsRef<Path>) -> Result<DiskUsage> {
        disk_usage(path)
    }

    /// Drop cached data so the next query refreshes.
    pub fn invalidate(&self) {
        *self
            .last_refresh
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn fresh_system(&self) -> RwLockReadGuard<'_, System> {
        self.maybe_refresh();
        self.system.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn maybe_refresh(&self) {
        let should_refresh = self
            .last_refresh
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(true, |t| t.elapsed() >= self.cache_ttl);
        if !should_refresh {
            return;
        }

        let mut system = self.system.write().unwrap_or_else(PoisonError::into_inner);
        system.refresh_cpu_all();
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );
        *self
            .last_refresh
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        debug!("Refreshed system information");
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(ProcessConfig::SYSTEM_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_snapshot() {
        let monitor = SystemMonitor::default();
        let snapshot = monitor.system_snapshot();

        assert!(snapshot.cpu_usage >= 0.0);
        assert!(snapshot.cpu_count > 0);
        assert!(snapshot.ram_total > 0);
        assert!(snapshot.ram_used <= snapshot.ram_total);
        assert!(snapshot.swap_used <= snapshot.swap_total);
    }

    #[test]
    fn test_process_resources_self() {
        let monitor = SystemMonitor::default();
        let resources = monitor
            .process_resources(std::process::id(), false)
            .unwrap();
        assert_eq!(resources.process_count, 1);
        assert!(resources.memory > 0);
    }

    #[test]
    fn test_process_resources_missing() {
        let monitor = SystemMonitor::default();
        assert!(matches!(
            monitor.process_resources(999_999_999, true),
            Err(ShellError::ProcessNotFound { .. })
        ));
        assert!(!monitor.process_exists(999_999_999));
    }

    #[cfg(unix)]
    #[test]
    fn test_child_pids_include_spawned() {
        let mut child = std::process::Command::new("sleep")
            .arg("5")
            .spawn()
            .unwrap();
        let monitor = SystemMonitor::new(Duration::ZERO);

        assert!(monitor.child_pids(std::process::id()).contains(&child.id()));
        assert!(monitor.process_exists(child.id()));

        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_invalidate_forces_refresh() {
        let monitor = SystemMonitor::new(Duration::from_secs(3600));
        assert!(monitor.process_exists(std::process::id()));
        monitor.invalidate();
        assert!(monitor.process_exists(std::process::id()));
    }
}
