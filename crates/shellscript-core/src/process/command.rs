//! Running commands to completion.

use super::handle::ProcessHandle;
use super::query::proc_present;
use crate::config::ProcessConfig;
use crate::error::{Result, ShellError};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Where a command's standard input comes from.
#[derive(Debug, Default)]
pub enum Stdin {
    /// Share the caller's stdin.
    #[default]
    Inherit,
    /// Empty input.
    Null,
    /// Feed this text, then close.
    Text(String),
    /// Feed these bytes, then close.
    Bytes(Vec<u8>),
    /// Read another process's stdout. Only the first command run with these
    /// options gets the pipe; later runs see empty input.
    Pipe(Mutex<Option<ChildStdout>>),
}

impl Stdin {
    /// Pipe the stdout of a spawned process into the next command.
    ///
    /// The handle must have been spawned with captured output.
    pub fn from_handle(handle: &mut ProcessHandle) -> Result<Self> {
        let stdout = handle.take_stdout().ok_or_else(|| {
            ShellError::invalid("stdin", format!("stdout of `{}` is not captured", handle.command()))
        })?;
        Ok(Stdin::Pipe(Mutex::new(Some(stdout))))
    }

    /// Stdio for the child plus the data to write into it after spawning.
    fn prepare(&self) -> (Stdio, Option<Vec<u8>>) {
        match self {
            Stdin::Inherit => (Stdio::inherit(), None),
            Stdin::Null => (Stdio::null(), None),
            Stdin::Text(text) => (Stdio::piped(), Some(text.clone().into_bytes())),
            Stdin::Bytes(bytes) => (Stdio::piped(), Some(bytes.clone())),
            Stdin::Pipe(slot) => {
                let taken = slot
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .take();
                match taken {
                    Some(stdout) => (Stdio::from(stdout), None),
                    None => (Stdio::null(), None),
                }
            }
        }
    }
}

/// Options shared by [`run`], [`run_args`], [`spawn`] and `sh`.
#[derive(Debug)]
pub struct RunOptions {
    /// Capture stdout and stderr instead of inheriting them.
    pub capture_output: bool,
    pub stdin: Stdin,
    /// Working directory of the child.
    pub cwd: Option<PathBuf>,
    /// Environment overrides, applied after `env_clear`.
    pub env: BTreeMap<String, String>,
    /// Start the child with an empty environment.
    pub env_clear: bool,
    /// Kill the child when it runs longer than this. For [`spawn`] the limit
    /// applies to `ProcessHandle::wait` and `wait_with_output`.
    pub timeout: Option<Duration>,
    /// Refuse to start when a process with the same program name exists.
    pub ensure_unique: bool,
    /// Run through the platform shell (`sh -c` / `cmd /C`). When false the
    /// command string is split on whitespace and executed directly.
    pub shell: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capture_output: true,
            stdin: Stdin::Inherit,
            cwd: None,
            env: BTreeMap::new(),
            env_clear: false,
            timeout: None,
            ensure_unique: false,
            shell: true,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    pub fn with_stdin(mut self, stdin: Stdin) -> Self {
        self.stdin = stdin;
        self
    }

    /// Shorthand for `with_stdin(Stdin::Text(..))`.
    pub fn with_input(self, text: impl Into<String>) -> Self {
        self.with_stdin(Stdin::Text(text.into()))
    }

    pub fn with_cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_env_clear(mut self, clear: bool) -> Self {
        self.env_clear = clear;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_ensure_unique(mut self, unique: bool) -> Self {
        self.ensure_unique = unique;
        self
    }

    pub fn with_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// The command as it was given.
    pub command: String,
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout, `None` when output was not captured.
    pub stdout: Option<String>,
    /// Captured stderr, `None` when output was not captured.
    pub stderr: Option<String>,
    pub elapsed: Duration,
}

impl RunOutput {
    /// True for exit code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into `CommandFailed`.
    pub fn check(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ShellError::CommandFailed {
                command: self.command,
                code: self.code,
            })
        }
    }

    /// Captured stdout, or `""`.
    pub fn stdout_str(&self) -> &str {
        self.stdout.as_deref().unwrap_or_default()
    }

    /// Captured stderr, or `""`.
    pub fn stderr_str(&self) -> &str {
        self.stderr.as_deref().unwrap_or_default()
    }

    /// Captured stdout split into lines.
    pub fn lines(&self) -> Vec<&str> {
        self.stdout_str().lines().collect()
    }
}

/// Program name a command string would execute: the file name of its first token.
pub(crate) fn program_name(command: &str) -> Option<String> {
    let first = command.split_whitespace().next()?;
    Path::new(first)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

/// Build the `Command` for a command string according to `opts.shell`.
pub(crate) fn build_command(command: &str, opts: &RunOptions) -> Result<Command> {
    if opts.shell {
        let mut cmd = Command::new(ProcessConfig::SHELL);
        cmd.arg(ProcessConfig::SHELL_FLAG).arg(command);
        return Ok(cmd);
    }

    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| ShellError::invalid("command", "empty command"))?;
    let mut cmd = Command::new(program);
    cmd.args(parts);
    Ok(cmd)
}

pub(crate) fn check_unique(command: &str, opts: &RunOptions) -> Result<()> {
    if !opts.ensure_unique {
        return Ok(());
    }
    if let Some(name) = program_name(command) {
        if proc_present(&name, None) {
            return Err(ShellError::AlreadyRunning { name });
        }
    }
    Ok(())
}

/// Apply cwd, env and stdio settings. Returns the bytes to feed to stdin.
pub(crate) fn configure(cmd: &mut Command, opts: &RunOptions) -> Option<Vec<u8>> {
    if let Some(dir) = &opts.cwd {
        cmd.current_dir(dir);
    }
    if opts.env_clear {
        cmd.env_clear();
    }
    cmd.envs(&opts.env);

    let (stdin, input) = opts.stdin.prepare();
    cmd.stdin(stdin);
    if opts.capture_output {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }

    // A separate process group lets a timeout kill the shell and whatever
    // it started in one go.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if opts.timeout.is_some() {
            cmd.process_group(0);
        }
    }

    input
}

pub(crate) fn spawn_child(cmd: &mut Command, command: &str) -> Result<Child> {
    let child = cmd.spawn().map_err(|source| ShellError::Spawn {
        command: command.to_string(),
        source,
    })?;
    debug!("Spawned `{}` as PID {}", command, child.id());
    Ok(child)
}

/// Write `input` to the child's stdin on a background thread, then close it.
pub(crate) fn feed_stdin(child: &mut Child, input: Option<Vec<u8>>) {
    let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) else {
        return;
    };
    thread::spawn(move || {
        // The child may exit without reading; a broken pipe is expected then.
        if let Err(e) = stdin.write_all(&input) {
            debug!("stdin write stopped: {}", e);
        }
    });
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                debug!("Output drain stopped: {}", e);
            }
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> Option<String> {
    handle.map(|h| h.join().unwrap_or_default())
}

/// Kill a timed out child and, on Unix, its whole process group.
pub(crate) fn kill_timed_out(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid as NixPid;
        if let Ok(raw) = i32::try_from(child.id()) {
            if let Err(e) = killpg(NixPid::from_raw(raw), Signal::SIGKILL) {
                debug!("killpg {} failed: {}", raw, e);
            }
        }
    }
    if let Err(e) = child.kill() {
        debug!("kill {} failed: {}", child.id(), e);
    }
    if let Err(e) = child.wait() {
        warn!("Failed to reap {}: {}", child.id(), e);
    }
}

/// Wait for a spawned child, draining its pipes, honoring `timeout`.
pub(crate) fn wait_child(
    mut child: Child,
    command: &str,
    timeout: Option<Duration>,
    started: Instant,
) -> Result<RunOutput> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        None => child
            .wait()
            .map_err(|e| ShellError::Other(format!("Failed to wait for `{}`: {}", command, e)))?,
        Some(limit) => loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= limit => {
                    debug!("`{}` exceeded {:?}, killing", command, limit);
                    kill_timed_out(&mut child);
                    // Drain threads are left to finish on their own; an
                    // orphaned grandchild may still hold the pipes.
                    return Err(ShellError::Timeout {
                        command: command.to_string(),
                        timeout: limit,
                    });
                }
                Ok(None) => thread::sleep(ProcessConfig::POLL_INTERVAL),
                Err(e) => {
                    return Err(ShellError::Other(format!(
                        "Failed to poll `{}`: {}",
                        command, e
                    )))
                }
            }
        },
    };

    let output = RunOutput {
        command: command.to_string(),
        code: status.code(),
        stdout: join(stdout),
        stderr: join(stderr),
        elapsed: started.elapsed(),
    };
    debug!(
        "`{}` exited with {:?} after {:?}",
        command, output.code, output.elapsed
    );
    Ok(output)
}

fn execute(mut cmd: Command, command: &str, opts: &RunOptions) -> Result<RunOutput> {
    check_unique(command, opts)?;
    let input = configure(&mut cmd, opts);
    let started = Instant::now();
    let mut child = spawn_child(&mut cmd, command)?;
    feed_stdin(&mut child, input);
    wait_child(child, command, opts.timeout, started)
}

/// Run a command and wait for it.
///
/// A non-zero exit is not an error; call [`RunOutput::check`] for that.
///
/// ```no_run
/// use shellscript::process::{run, RunOptions};
///
/// let out = run("ls -l /tmp", &RunOptions::default())?;
/// for line in out.lines() {
///     println!("{line}");
/// }
/// # Ok::<(), shellscript::ShellError>(())
/// ```
pub fn run(command: &str, opts: &RunOptions) -> Result<RunOutput> {
    let cmd = build_command(command, opts)?;
    execute(cmd, command, opts)
}

/// Run `program` with explicit arguments, never through a shell.
pub fn run_args<S: AsRef<str>>(program: &str, args: &[S], opts: &RunOptions) -> Result<RunOutput> {
    let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
    let mut cmd = Command::new(program);
    cmd.args(&args);
    let display = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    execute(cmd, &display, opts)
}

/// Start a command in the background.
pub fn spawn(command: &str, opts: &RunOptions) -> Result<ProcessHandle> {
    check_unique(command, opts)?;
    let mut cmd = build_command(command, opts)?;
    let input = configure(&mut cmd, opts);
    let started = Instant::now();
    let mut child = spawn_child(&mut cmd, command)?;
    feed_stdin(&mut child, input);
    Ok(ProcessHandle::new(child, command.to_string(), started, opts.timeout))
}
