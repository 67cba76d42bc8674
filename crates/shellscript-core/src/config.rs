//! Centralized configuration for shellscript.
//!
//! Buffer sizes, polling intervals and other tunables shared by the file and
//! process helpers.

use std::time::Duration;

/// File operation tunables.
pub struct FileConfig;

impl FileConfig {
    /// Block size used when splitting and combining files.
    pub const SPLIT_BLOCK_SIZE: usize = 64 * 1024;
    /// Buffer size used by `copy_file_with_progress`.
    pub const PROGRESS_COPY_BUFFER: usize = 1024 * 1024;
    /// Minimum time between two console progress redraws.
    pub const PROGRESS_PRINT_INTERVAL: Duration = Duration::from_secs(1);
    /// Width of the progress bar in characters.
    pub const PROGRESS_BAR_WIDTH: usize = 50;
    /// Number of digits in a chunk suffix (`.001`).
    pub const CHUNK_SUFFIX_DIGITS: usize = 3;
}

/// Process execution tunables.
pub struct ProcessConfig;

impl ProcessConfig {
    /// How often a running child is polled while waiting with a timeout.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(10);
    /// Grace period between SIGTERM and SIGKILL.
    pub const TERMINATE_GRACE: Duration = Duration::from_secs(2);
    /// How long cached `sysinfo` data stays fresh.
    pub const SYSTEM_CACHE_TTL: Duration = Duration::from_secs(2);

    #[cfg(windows)]
    pub const SHELL: &'static str = "cmd";
    #[cfg(windows)]
    pub const SHELL_FLAG: &'static str = "/C";

    #[cfg(not(windows))]
    pub const SHELL: &'static str = "sh";
    #[cfg(not(windows))]
    pub const SHELL_FLAG: &'static str = "-c";
}
