//! Shell command execution with a hard timeout.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use tracing::{debug, warn};

const RUNNER_TARGET: &str = "quill::runner";

/// How long to wait for output to flush after the process group is killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The process exited. The code is absent when a signal ended it.
    Exited(Option<i32>),
    /// The process outlived its budget and was killed.
    TimedOut,
}

impl CommandStatus {
    /// Returns whether the command exited with status zero.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(Some(0)))
    }
}

/// Captured result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status.
    pub status: CommandStatus,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
}

/// Runs shell command lines on behalf of `run-command` directives.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` in `cwd`, killing it once `timeout` elapses.
    ///
    /// # Errors
    /// Returns an error when the process cannot be spawned or waited on.
    fn run(&self, command: &str, cwd: &Utf8Path, timeout: Duration) -> io::Result<CommandOutput>;
}

/// [`CommandRunner`] that hands the line to the platform shell.
///
/// Output is drained on background threads so a chatty child never blocks on
/// a full pipe. The budget covers both the shell and its output: a command
/// that leaves a background process holding the pipes open counts as still
/// running. On Unix the child leads its own process group, and the group is
/// killed once the command ends or times out, taking any grandchildren with
/// it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str, cwd: &Utf8Path, timeout: Duration) -> io::Result<CommandOutput> {
        let mut child = shell(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        debug!(
            target: RUNNER_TARGET,
            command,
            pid = child.id(),
            "spawned command"
        );

        let deadline = Instant::now() + timeout;
        let mut stdout = Capture::spawn(child.stdout.take());
        let mut stderr = Capture::spawn(child.stderr.take());
        let exit = wait_until(&mut child, deadline)?;
        let drained = exit.is_some() && stdout.wait_until(deadline) && stderr.wait_until(deadline);

        if exit.is_some() && !drained {
            warn!(
                target: RUNNER_TARGET,
                timeout_secs = timeout.as_secs(),
                "command left background processes holding its output, killing process group"
            );
        }
        kill_tree(&mut child, exit.is_none());

        let status = match exit {
            Some(exit) if drained => CommandStatus::Exited(exit.code()),
            _ => CommandStatus::TimedOut,
        };
        let grace = Instant::now() + KILL_GRACE;
        stdout.wait_until(grace);
        stderr.wait_until(grace);

        Ok(CommandOutput {
            status,
            stdout: stdout.into_string(),
            stderr: stderr.into_string(),
        })
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    use std::os::unix::process::CommandExt;

    let mut shell = Command::new("sh");
    shell.arg("-c").arg(command).process_group(0);
    shell
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut shell = Command::new("cmd");
    shell.arg("/C").arg(command);
    shell
}

/// Output of one pipe, read to the end on a background thread.
struct Capture {
    receiver: Option<Receiver<Vec<u8>>>,
    bytes: Vec<u8>,
}

impl Capture {
    fn spawn<R: Read + Send + 'static>(source: Option<R>) -> Self {
        let receiver = source.map(|mut reader| {
            let (sender, receiver) = mpsc::channel();
            thread::spawn(move || {
                let mut buffer = Vec::new();
                drop(reader.read_to_end(&mut buffer));
                drop(sender.send(buffer));
            });
            receiver
        });
        Self {
            receiver,
            bytes: Vec::new(),
        }
    }

    /// Waits for the pipe to close. Returns `false` if it is still open at
    /// `deadline`.
    fn wait_until(&mut self, deadline: Instant) -> bool {
        let Some(receiver) = &self.receiver else {
            return true;
        };
        match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(bytes) => {
                self.bytes = bytes;
                self.receiver = None;
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                self.receiver = None;
                true
            }
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Polls the child until it exits or `deadline` passes.
///
/// Returns `None` when the child is still running at the deadline.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    let poll_interval = Duration::from_millis(50);

    loop {
        if let Some(status) = child.try_wait()? {
            debug!(target: RUNNER_TARGET, ?status, "command exited");
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            warn!(
                target: RUNNER_TARGET,
                "command timed out, killing process group"
            );
            return Ok(None);
        }
        thread::sleep(poll_interval);
    }
}

/// Kills whatever is left of the command's process group. The shell itself
/// is killed and reaped only when it is still running.
#[cfg(unix)]
fn kill_tree(child: &mut Child, running: bool) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        drop(killpg(Pid::from_raw(pid), Signal::SIGKILL));
    }
    if running {
        drop(child.kill());
        drop(child.wait());
    }
}

#[cfg(windows)]
fn kill_tree(child: &mut Child, running: bool) {
    if running {
        drop(child.kill());
        drop(child.wait());
    }
}
