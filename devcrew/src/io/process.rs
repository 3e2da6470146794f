//! Helpers for running child processes with timeouts and bounded output.

use std::io::{ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// How long output readers may keep draining after a timeout kill.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl CommandOutput {
    /// Captured stdout decoded as text (invalid UTF-8 is replaced).
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Captured stderr decoded as text (invalid UTF-8 is replaced).
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// The child gets a null stdin. Output is read concurrently while the child runs;
/// `output_limit_bytes` bounds how much of each stream is kept in memory (bytes beyond
/// this are discarded while still draining the pipe).
///
/// On Unix the child leads its own process group. On timeout the whole group is
/// killed, the child is reaped, and the readers get [`DRAIN_GRACE`] to finish;
/// output still held open by an escaped descendant is abandoned.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs_f64(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    own_process_group(&mut cmd);

    debug!("spawning child process");
    let started = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs_f64(),
                "command timed out, killing"
            );
            timed_out = true;
            kill_process_tree(&mut child)?;
            child.wait().context("wait command after kill")?
        }
    };
    let elapsed = started.elapsed();

    let (stdout, stdout_truncated, stderr, stderr_truncated) = if timed_out {
        let (stdout, stdout_truncated) =
            join_output_within(stdout_handle, DRAIN_GRACE).context("join stdout")?;
        let (stderr, stderr_truncated) =
            join_output_within(stderr_handle, DRAIN_GRACE).context("join stderr")?;
        (stdout, stdout_truncated, stderr, stderr_truncated)
    } else {
        let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
        let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;
        (stdout, stdout_truncated, stderr, stderr_truncated)
    };

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, elapsed_ms = elapsed.as_millis() as u64, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
        elapsed,
    })
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// Kill the child and, on Unix, every process in its group.
fn kill_process_tree(child: &mut Child) -> Result<()> {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        match Command::new("kill")
            .args(["-s", "KILL", "--", &group])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => debug!(pgid = child.id(), "process group killed"),
            Ok(status) => warn!(%status, pgid = child.id(), "process group kill failed"),
            Err(e) => warn!(err = %e, pgid = child.id(), "could not run kill for process group"),
        }
    }
    match child.kill() {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::InvalidInput => Ok(()),
        Err(e) => Err(e).context("kill command"),
    }
}

/// Join a reader, giving up after `grace` if the pipe is still held open.
fn join_output_within(
    handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>,
    grace: Duration,
) -> Result<(Vec<u8>, usize)> {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!("output pipe still open after kill, abandoning reader");
            return Ok((Vec::new(), 0));
        }
        thread::sleep(Duration::from_millis(10));
    }
    join_output(handle)
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
