//! Confirmation-gated, single-shot execution of generated code.
//!
//! Each invocation walks `AwaitingConfirmation -> {Aborted | Running}` and then
//! ends in exactly one [`ExecutionResult`]. The sandbox never returns an error:
//! launch and I/O failures become [`ExecutionResult::SystemError`]. The backing
//! temporary script is private to one invocation and is removed before
//! [`Sandbox::execute`] returns, whatever the outcome.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempPath;
use tracing::{debug, info, instrument, warn};

use crate::core::types::ExecutionResult;
use crate::io::config::SandboxConfig;
use crate::io::process::{CommandOutput, run_command_with_timeout};

/// Prefix of every temporary script file.
pub const SCRIPT_PREFIX: &str = "devcrew-";

/// Decision gate consulted before any file or process is created.
pub trait Confirm {
    /// Return `true` to let `code` run.
    fn confirm(&mut self, code: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, code: &str) -> bool {
        self(code)
    }
}

/// Parameters for one script launch.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    /// Interpreter binary (looked up on `PATH`).
    pub interpreter: String,
    /// Arguments placed before the script path.
    pub args: Vec<String>,
    /// Materialized script; exists for the whole call.
    pub script_path: PathBuf,
    /// Wall-clock bound for the child.
    pub timeout: Duration,
    /// Per-stream capture limit.
    pub output_limit_bytes: usize,
}

/// Abstraction over process launching so tests can observe or replace it.
pub trait ScriptRunner {
    /// Launch the script once and wait for it, killing it on timeout.
    fn run(&self, request: &ScriptRequest) -> Result<CommandOutput>;
}

/// Runs `<interpreter> [args...] <script>` as a real child process.
pub struct InterpreterRunner;

impl ScriptRunner for InterpreterRunner {
    fn run(&self, request: &ScriptRequest) -> Result<CommandOutput> {
        let mut cmd = Command::new(&request.interpreter);
        cmd.args(&request.args).arg(&request.script_path);
        run_command_with_timeout(cmd, request.timeout, request.output_limit_bytes).with_context(
            || {
                format!(
                    "run {} {}",
                    request.interpreter,
                    request.script_path.display()
                )
            },
        )
    }
}

/// What one sandbox invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub result: ExecutionResult,
    /// Path of the temporary script; `None` when nothing was materialized.
    /// The file no longer exists once the report is returned.
    pub script_path: Option<PathBuf>,
    /// Child wall-clock time, when a child actually ran.
    pub elapsed: Option<Duration>,
}

impl ExecutionReport {
    fn without_script(result: ExecutionResult) -> Self {
        Self {
            result,
            script_path: None,
            elapsed: None,
        }
    }
}

/// Stateless code runner; holds only configuration and a launcher.
pub struct Sandbox<R = InterpreterRunner> {
    config: SandboxConfig,
    runner: R,
}

impl Sandbox<InterpreterRunner> {
    pub fn new(config: SandboxConfig) -> Self {
        Self::with_runner(config, InterpreterRunner)
    }
}

impl<R: ScriptRunner> Sandbox<R> {
    pub fn with_runner(config: SandboxConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Ask for confirmation, then run `code` once in a fresh temporary file.
    #[instrument(skip_all, fields(interpreter = %self.config.interpreter, timeout_secs = self.config.timeout_secs))]
    pub fn execute<C: Confirm + ?Sized>(&self, code: &str, confirm: &mut C) -> ExecutionReport {
        if !confirm.confirm(code) {
            info!("code execution declined by operator");
            return ExecutionReport::without_script(ExecutionResult::Aborted);
        }

        let script = match materialize(code, &self.config.file_suffix) {
            Ok(script) => script,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "failed to materialize script");
                return ExecutionReport::without_script(ExecutionResult::SystemError {
                    message: format!("{err:#}"),
                });
            }
        };
        let script_path = script.to_path_buf();
        debug!(script = %script_path.display(), "script materialized");

        let request = ScriptRequest {
            interpreter: self.config.interpreter.clone(),
            args: self.config.args.clone(),
            script_path: script_path.clone(),
            timeout: self.config.timeout(),
            output_limit_bytes: self.config.output_limit_bytes,
        };
        let outcome = self.runner.run(&request);

        // Deleted exactly once on every path; failure here is only reported.
        if let Err(err) = script.close() {
            warn!(err = %err, script = %script_path.display(), "failed to remove script");
        }

        let (result, elapsed) = match outcome {
            Ok(output) => (classify(&output), Some(output.elapsed)),
            Err(err) => (
                ExecutionResult::SystemError {
                    message: format!("{err:#}"),
                },
                None,
            ),
        };
        info!(outcome = result.kind(), "code execution finished");

        ExecutionReport {
            result,
            script_path: Some(script_path),
            elapsed,
        }
    }
}

fn classify(output: &CommandOutput) -> ExecutionResult {
    if output.timed_out {
        ExecutionResult::Timeout
    } else if output.status.success() {
        ExecutionResult::Success {
            stdout: output.stdout_text(),
        }
    } else {
        ExecutionResult::Failure {
            stderr: output.stderr_text(),
            exit_code: output.status.code(),
        }
    }
}

/// Write `code` to a uniquely named temp file and close the handle.
///
/// The returned [`TempPath`] removes the file when closed or dropped.
fn materialize(code: &str, suffix: &str) -> Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix(SCRIPT_PREFIX)
        .suffix(suffix)
        .tempfile()
        .context("create temporary script")?;
    file.write_all(code.as_bytes())
        .context("write temporary script")?;
    file.flush().context("flush temporary script")?;
    Ok(file.into_temp_path())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{SpyRunner, sh_sandbox_config};
    use std::fs;
    use std::time::Instant;

    fn sh_sandbox(timeout_secs: u64) -> Sandbox {
        Sandbox::new(sh_sandbox_config(timeout_secs))
    }

    fn always_yes(_: &str) -> bool {
        true
    }

    #[test]
    fn declined_confirmation_never_spawns() {
        let sandbox = Sandbox::with_runner(sh_sandbox_config(5), SpyRunner::new());
        let mut asked = Vec::new();
        let mut decline = |code: &str| {
            asked.push(code.to_string());
            false
        };

        let report = sandbox.execute("echo hi", &mut decline);

        assert_eq!(report.result, ExecutionResult::Aborted);
        assert_eq!(report.script_path, None);
        assert_eq!(report.elapsed, None);
        assert_eq!(sandbox.runner().calls(), 0);
        assert_eq!(asked, vec!["echo hi".to_string()]);
    }

    #[test]
    fn zero_exit_yields_stdout() {
        let report = sh_sandbox(5).execute("echo hello", &mut always_yes);

        assert_eq!(
            report.result,
            ExecutionResult::Success {
                stdout: "hello\n".to_string()
            }
        );
        let elapsed = report.elapsed.expect("child ran");
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
        let path = report.script_path.expect("script path");
        assert!(!path.exists(), "script must be removed");
        assert!(
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(SCRIPT_PREFIX) && n.ends_with(".sh"))
        );
    }

    #[test]
    fn nonzero_exit_yields_stderr() {
        let report = sh_sandbox(5).execute("echo boom >&2\nexit 1\n", &mut always_yes);

        match report.result {
            ExecutionResult::Failure { stderr, exit_code } => {
                assert!(stderr.contains("boom"));
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!report.script_path.expect("script path").exists());
    }

    #[test]
    fn infinite_loop_times_out_and_child_is_gone() {
        let temp = tempfile::tempdir().expect("tempdir");
        let pid_file = temp.path().join("pid");
        let code = format!("echo $$ > '{}'\nwhile :; do :; done\n", pid_file.display());

        let started = Instant::now();
        let report = sh_sandbox(1).execute(&code, &mut always_yes);
        let elapsed = started.elapsed();

        assert_eq!(report.result, ExecutionResult::Timeout);
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
        assert!(!report.script_path.expect("script path").exists());

        let pid = fs::read_to_string(&pid_file).expect("pid file");
        let alive = Command::new("kill")
            .arg("-0")
            .arg(pid.trim())
            .stderr(std::process::Stdio::null())
            .status()
            .expect("kill -0");
        assert!(!alive.success(), "child {} still running", pid.trim());
    }

    #[test]
    fn missing_interpreter_is_system_error_and_cleans_up() {
        let mut config = sh_sandbox_config(5);
        config.interpreter = "devcrew-no-such-interpreter".to_string();
        let report = Sandbox::new(config).execute("print('hi')", &mut always_yes);

        match report.result {
            ExecutionResult::SystemError { message } => {
                assert!(message.contains("devcrew-no-such-interpreter"));
                assert!(message.contains("spawn command"));
            }
            other => panic!("expected system error, got {other:?}"),
        }
        assert!(!report.script_path.expect("script path").exists());
    }

    #[test]
    fn script_exists_only_while_running() {
        let sandbox = Sandbox::with_runner(sh_sandbox_config(5), SpyRunner::new());
        let report = sandbox.execute("echo spy", &mut always_yes);

        let seen = sandbox.runner().last_request().expect("request");
        assert_eq!(seen.contents.as_deref(), Some("echo spy"));
        assert_eq!(seen.request.timeout, Duration::from_secs(5));
        assert_eq!(sandbox.runner().calls(), 1);
        assert_eq!(report.script_path.as_ref(), Some(&seen.request.script_path));
        assert!(!seen.request.script_path.exists());
    }

    #[test]
    fn consecutive_runs_use_distinct_paths() {
        let sandbox = sh_sandbox(5);
        let first = sandbox.execute("true", &mut always_yes);
        let second = sandbox.execute("true", &mut always_yes);

        let first = first.script_path.expect("first path");
        let second = second.script_path.expect("second path");
        assert_ne!(first, second);
    }
}
