//! Process execution and inspection.
//!
//! - [`run`] / [`run_args`] block until the command exits (or times out)
//! - [`spawn`] returns a [`ProcessHandle`] for background work
//! - [`sh`] runs a multi-line script line by line
//! - [`query`] looks at the OS process table through `sysinfo`
//!
//! # Example
//!
//! ```rust,no_run
//! use shellscript::process::{proc_present, run, RunOptions};
//! use std::time::Duration;
//!
//! if !proc_present("nginx", None) {
//!     let opts = RunOptions::new().with_timeout(Duration::from_secs(10));
//!     run("systemctl start nginx", &opts)?.check()?;
//! }
//! # Ok::<(), shellscript::ShellError>(())
//! ```

mod command;
mod handle;
pub mod query;
mod script;

pub use command::{run, run_args, spawn, RunOptions, RunOutput, Stdin};
pub use handle::ProcessHandle;
pub use query::{
    kill_process, list_processes, name_list, pid_list, proc_present, process_info, to_records,
    ProcessFilter, ProcessSnapshot, PROCESS_ATTRS,
};
pub use script::{sh, sh_with, ShOptions};
