//! System information.
//!
//! Provides:
//! - CPU, memory, swap, uptime and load snapshots
//! - Per-process resource usage, optionally summed over descendants
//! - Disk usage for the file system holding a path
//!
//! # Example
//!
//! ```rust,no_run
//! use shellscript::system::SystemMonitor;
//!
//! let monitor = SystemMonitor::default();
//! let snapshot = monitor.system_snapshot();
//! println!("RAM: {} of {} bytes used", snapshot.ram_used, snapshot.ram_total);
//!
//! let disk = monitor.disk_usage("/")?;
//! println!("Disk: {}% used", disk.percent);
//! # Ok::<(), shellscript::ShellError>(())
//! ```

mod disk;
mod resources;

pub use disk::{disk_usage, DiskUsage};
pub use resources::{ProcessResources, SystemMonitor, SystemSnapshot};
