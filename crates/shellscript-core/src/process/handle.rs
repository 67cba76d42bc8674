//! Handle to a command running in the background.

use super::command::{kill_timed_out, wait_child, RunOutput};
use crate::config::ProcessConfig;
use crate::error::{Result, ShellError};
use std::process::{Child, ChildStdout};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// A child process started by [`spawn`](super::spawn).
///
/// The handle owns the child. Dropping it neither waits for nor kills the
/// process.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    command: String,
    started: Instant,
    timeout: Option<Duration>,
}

impl ProcessHandle {
    pub(crate) fn new(
        child: Child,
        command: String,
        started: Instant,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            child,
            command,
            started,
            timeout,
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Time since the process was started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True until the process has exited.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Take the captured stdout pipe, e.g. to feed another command.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Block until exit and return the exit code.
    ///
    /// With a `RunOptions::timeout` the process is killed once the limit,
    /// counted from start, is exceeded and `Timeout` is returned.
    ///
    /// Captured pipes that are never read can fill up and stall the child;
    /// use [`wait_with_output`](Self::wait_with_output) when output is captured.
    pub fn wait(&mut self) -> Result<Option<i32>> {
        let Some(limit) = self.timeout else {
            let status = self.child.wait().map_err(|e| self.wait_error(e))?;
            return Ok(status.code());
        };

        let remaining = limit.saturating_sub(self.started.elapsed());
        match self.wait_timeout(remaining) {
            Err(e) if e.is_timeout() => {
                debug!("`{}` exceeded {:?}, killing", self.command, limit);
                kill_timed_out(&mut self.child);
                Err(ShellError::Timeout {
                    command: self.command.clone(),
                    timeout: limit,
                })
            }
            other => other,
        }
    }

    /// Block until exit, collecting whatever stdout and stderr were captured.
    /// Honors the `RunOptions::timeout` given to `spawn`.
    pub fn wait_with_output(self) -> Result<RunOutput> {
        wait_child(self.child, &self.command, self.timeout, self.started)
    }

    /// Wait at most `timeout` for the process to exit.
    ///
    /// Fails with `Timeout` when it is still running; the process is left alone.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<i32>> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Ok(status.code()),
                Ok(None) if Instant::now() >= deadline => {
                    return Err(ShellError::Timeout {
                        command: self.command.clone(),
                        timeout,
                    })
                }
                Ok(None) => thread::sleep(ProcessConfig::POLL_INTERVAL),
                Err(e) => return Err(self.wait_error(e)),
            }
        }
    }

    /// Kill immediately (SIGKILL / TerminateProcess) and reap.
    pub fn kill(&mut self) -> Result<()> {
        if self.child.try_wait().ok().flatten().is_some() {
            return Ok(());
        }
        self.child.kill().map_err(|e| self.wait_error(e))?;
        self.child.wait().map_err(|e| self.wait_error(e))?;
        debug!("Killed `{}` (PID {})", self.command, self.pid());
        Ok(())
    }

    /// [`terminate`](Self::terminate) with the default grace period.
    pub fn stop(&mut self) -> Result<bool> {
        self.terminate(ProcessConfig::TERMINATE_GRACE)
    }

    /// Ask the process to stop (SIGTERM on Unix), kill it after `grace`.
    ///
    /// Returns `true` when it exited within the grace period.
    pub fn terminate(&mut self, grace: Duration) -> Result<bool> {
        if self.child.try_wait().ok().flatten().is_some() {
            return Ok(true);
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid as NixPid;

            let raw = i32::try_from(self.pid()).map_err(|_| ShellError::ProcessNotFound {
                pid: self.pid(),
            })?;
            if let Err(e) = kill(NixPid::from_raw(raw), Signal::SIGTERM) {
                debug!("SIGTERM to {} failed: {}", raw, e);
            }
            match self.wait_timeout(grace) {
                Ok(_) => return Ok(true),
                Err(e) if e.is_timeout() => {}
                Err(e) => return Err(e),
            }
        }

        #[cfg(not(unix))]
        let _ = grace;

        self.kill()?;
        Ok(false)
    }

    fn wait_error(&self, err: std::io::Error) -> ShellError {
        ShellError::Other(format!(
            "Failed to manage `{}` (PID {}): {}",
            self.command,
            self.child.id(),
            err
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::super::command::{spawn, RunOptions};
    use super::*;

    #[test]
    fn test_spawn_and_wait_with_output() {
        let handle = spawn("echo background", &RunOptions::default()).unwrap();
        assert!(handle.pid() > 0);
        let out = handle.wait_with_output().unwrap();
        assert_eq!(out.stdout_str(), "background\n");
        assert!(out.success());
    }

    #[test]
    fn test_is_running_and_kill() {
        let mut handle = spawn("sleep 30", &RunOptions::default()).unwrap();
        assert!(handle.is_running());
        handle.kill().unwrap();
        assert!(!handle.is_running());
    }

    #[test]
    fn test_wait_timeout() {
        let mut handle = spawn("sleep 30", &RunOptions::default()).unwrap();
        let err = handle.wait_timeout(Duration::from_millis(50)).unwrap_err();
        assert!(err.is_timeout());
        assert!(handle.is_running());

        let exited_in_grace = handle.terminate(Duration::from_secs(2)).unwrap();
        assert!(exited_in_grace);
        assert!(!handle.is_running());
    }

    #[test]
    fn test_wait_exit_code() {
        let mut handle = spawn("exit 7", &RunOptions::default()).unwrap();
        assert_eq!(handle.wait().unwrap(), Some(7));
    }
}
