//! Multi-line scripts, one command per line.

use super::command::{run, RunOptions, RunOutput};
use crate::error::Result;
use tracing::debug;

/// Options for [`sh_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShOptions {
    /// Stop after the first line that exits non-zero.
    pub stop_on_error: bool,
}

/// Run every non-empty line of `script` in order, through the platform shell.
///
/// Lines run in separate shells, so `cd` or variable assignments do not carry
/// over. Spawn failures and timeouts abort the script.
pub fn sh(script: &str, opts: &RunOptions) -> Result<Vec<RunOutput>> {
    sh_with(script, opts, ShOptions::default())
}

/// [`sh`] with explicit script options.
pub fn sh_with(script: &str, opts: &RunOptions, sh_opts: ShOptions) -> Result<Vec<RunOutput>> {
    let mut results = Vec::new();
    for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let output = run(line, opts)?;
        let failed = !output.success();
        results.push(output);
        if failed && sh_opts.stop_on_error {
            debug!("Stopping script at failed line `{}`", line);
            break;
        }
    }
    Ok(results)
}
