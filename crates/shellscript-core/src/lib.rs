//! shellscript - helpers for writing shell-style scripts in Rust.
//!
//! A thin, synchronous layer over the standard library and `sysinfo` that
//! covers what scripts usually need: file content and tree operations,
//! running commands, looking at the process table, system resources and
//! date stamps in file names.
//!
//! Every helper is available from its module and flat from the crate root.
//! Scripts usually just glob-import the [`prelude`].
//!
//! # Example
//!
//! ```rust,no_run
//! use shellscript::prelude::*;
//!
//! fn main() -> shellscript::Result<()> {
//!     mkdir("backup", true)?;
//!     for file in find(".", "*.log", false)? {
//!         cp(&file, "backup")?;
//!     }
//!
//!     let out = run("df -h .", &RunOptions::default())?;
//!     print!("{}", out.stdout_str());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod datetime;
pub mod error;
pub mod fs;
pub mod platform;
pub mod process;
pub mod settings;
pub mod system;
pub mod systemd;

// Re-export commonly used types
pub use config::{FileConfig, ProcessConfig};
pub use error::{Result, ShellError};

pub use datetime::{
    delay, now, parse_datetime, to_hh_mm, to_hh_mm_ss, to_yyyy_mm_dd, to_yyyy_mm_dd_hh_mm,
    to_yyyy_mm_dd_hh_mm_ss, trim_millis, trim_seconds, trim_time, trim_time_millis,
    trim_time_seconds, Anchor, CalendarTime, DateTimeFormat, DateTimeParser, ParseOptions,
};
pub use fs::{
    accessed_time, append_text, cd, changed_time, combine_files, contains_glob_pattern,
    copy_dir, copy_file, copy_file_with_progress, cp, created_time, current_dir, cwd,
    expand_user, file_name, file_size, filter_by_substring, find, find_dirs, format_bytes,
    has_extension, mkdir, modified_time, move_to_dir, mv, read_bytes, read_text,
    read_text_or_empty, rename_only, rename_recursively, render_bar, rm, rmdir,
    set_created_time, set_current_dir, set_modified_time, sort_by_extension, sort_by_modified,
    sort_by_name, sort_by_size, split_chunks, split_file, total_size, touch, with_extension,
    write_bytes, write_lines, write_text, ConsoleProgress, CopyOptions, CopyProgress, EntryKind,
    FileFilter, OwnerFilter, RemoveKind, RmdirMode, TouchOptions,
};
pub use platform::{
    chmod, chown, current_platform, current_script_name, file_permissions, is_executable,
    is_linux, is_process_alive, is_readable, is_windows, is_writable, os_name, os_version,
    set_executable, terminate_process, terminate_process_tree, Owner,
};
pub use process::{
    kill_process, list_processes, name_list, pid_list, proc_present, process_info, run,
    run_args, sh, sh_with, spawn, to_records, ProcessFilter, ProcessHandle, ProcessSnapshot,
    RunOptions, RunOutput, ShOptions, Stdin, PROCESS_ATTRS,
};
pub use settings::{cast_values, load_or_create, load_yaml, save_yaml, SettingsFormat};
pub use system::{disk_usage, DiskUsage, ProcessResources, SystemMonitor, SystemSnapshot};

/// Everything a script needs, for `use shellscript::prelude::*`.
///
/// [`Result`] is left out so it does not shadow `std::result::Result`.
pub mod prelude {
    pub use crate::datetime::{
        delay, now, parse_datetime, to_hh_mm, to_hh_mm_ss, to_yyyy_mm_dd, to_yyyy_mm_dd_hh_mm,
        to_yyyy_mm_dd_hh_mm_ss, trim_millis, trim_seconds, trim_time, Anchor, DateTimeFormat,
        ParseOptions,
    };
    pub use crate::error::ShellError;
    pub use crate::fs::{
        accessed_time, append_text, cd, combine_files, copy_dir, copy_file,
        copy_file_with_progress, cp, created_time, cwd, expand_user, file_name, file_size,
        filter_by_substring, find, find_dirs, format_bytes, has_extension, mkdir, modified_time,
        move_to_dir, mv, read_bytes, read_text, read_text_or_empty, rename_only,
        rename_recursively, rm, rmdir, set_modified_time, sort_by_extension, sort_by_modified,
        sort_by_name, sort_by_size, split_chunks, split_file, total_size, touch, with_extension,
        write_bytes, write_lines, write_text, ConsoleProgress, CopyOptions, CopyProgress,
        FileFilter, OwnerFilter, RemoveKind, RmdirMode, TouchOptions,
    };
    pub use crate::platform::{
        chmod, chown, current_script_name, file_permissions, is_executable, is_linux,
        is_windows, os_name, os_version, set_executable, Owner,
    };
    pub use crate::process::{
        kill_process, list_processes, proc_present, process_info, run, run_args, sh, spawn,
        ProcessFilter, ProcessHandle, RunOptions, RunOutput, Stdin,
    };
    pub use crate::settings::{load_or_create, load_yaml, save_yaml, SettingsFormat};
    pub use crate::system::{disk_usage, SystemMonitor};
}
