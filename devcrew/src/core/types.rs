//! Shared deterministic types for pipeline outcomes.
//!
//! These types define stable contracts between the sandbox, the pipeline, and
//! the log sinks. They hold no handles and perform no I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every error rendering of an [`ExecutionResult`].
pub const EXECUTION_ERROR_PREFIX: &str = "Execution Error: ";

/// Terminal outcome of one sandbox invocation.
///
/// Exactly one variant holds once the sandbox returns; nothing intermediate
/// is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// The operator declined; no file was written and no process started.
    Aborted,
    /// The script exited with status 0.
    Success { stdout: String },
    /// The script exited non-zero (or was killed by a signal, `exit_code: None`).
    Failure {
        stderr: String,
        exit_code: Option<i32>,
    },
    /// The script exceeded its wall-clock bound and was killed.
    Timeout,
    /// The script could not be materialized or launched.
    SystemError { message: String },
}

impl ExecutionResult {
    /// `true` for outcomes that should trigger a corrective-prompt suggestion.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Failure { .. } | Self::Timeout | Self::SystemError { .. }
        )
    }

    /// Short machine-friendly label, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Aborted => "aborted",
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
            Self::Timeout => "timeout",
            Self::SystemError { .. } => "system_error",
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => f.write_str("Code execution aborted by user."),
            Self::Success { stdout } => f.write_str(stdout),
            Self::Failure { stderr, .. } => write!(f, "{EXECUTION_ERROR_PREFIX}{stderr}"),
            Self::Timeout => write!(f, "{EXECUTION_ERROR_PREFIX}Code execution timed out"),
            Self::SystemError { message } => write!(f, "{EXECUTION_ERROR_PREFIX}{message}"),
        }
    }
}

/// How a `devcrew run` session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every stage ran; carries the sandbox result.
    Completed(ExecutionResult),
    /// A stage failed and the error was caught at the top-level boundary.
    Failed { message: String },
}
