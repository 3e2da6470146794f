//! Test-only doubles for the provider, the operator, and process launching.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::process::ExitStatus;
use std::time::Duration;

use anyhow::Result;

use crate::core::confirm::is_affirmative;
use crate::io::config::SandboxConfig;
use crate::io::console::Operator;
use crate::io::process::CommandOutput;
use crate::io::provider::{ProviderError, TextCompletionProvider};
use crate::io::sandbox::{ScriptRequest, ScriptRunner};

/// Sandbox settings that run scripts with `sh`, independent of any Python install.
pub fn sh_sandbox_config(timeout_secs: u64) -> SandboxConfig {
    SandboxConfig {
        interpreter: "sh".to_string(),
        args: Vec::new(),
        file_suffix: ".sh".to_string(),
        timeout_secs,
        output_limit_bytes: 1_000_000,
    }
}

/// Provider that replays queued responses and records every prompt.
pub struct ScriptedProvider {
    responses: RefCell<VecDeque<Result<String, ProviderError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl TextCompletionProvider for ScriptedProvider {
    fn complete(&self, prompt: &str, _stop: &[String]) -> Result<String, ProviderError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(ProviderError::MalformedResponse(
                "scripted provider exhausted".to_string(),
            ))
        })
    }
}

/// Operator with a fixed requirement and a fixed confirmation answer.
pub struct ScriptedOperator {
    requirement: String,
    answer: String,
    confirmations: Vec<String>,
    messages: Vec<String>,
}

impl ScriptedOperator {
    /// `answer` is parsed like console input (`yes` in any case confirms).
    pub fn new(requirement: &str, answer: &str) -> Self {
        Self {
            requirement: requirement.to_string(),
            answer: answer.to_string(),
            confirmations: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Code shown at each confirmation question.
    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.clone()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether some message contained `needle`.
    pub fn said(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

impl Operator for ScriptedOperator {
    fn requirement(&mut self) -> Result<String> {
        Ok(self.requirement.clone())
    }

    fn confirm_execution(&mut self, code: &str) -> bool {
        self.confirmations.push(code.to_string());
        is_affirmative(&self.answer)
    }

    fn say(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// What a [`SpyRunner`] saw during one call.
#[derive(Debug, Clone)]
pub struct SpyCall {
    pub request: ScriptRequest,
    /// Script contents at call time; `None` if the file did not exist.
    pub contents: Option<String>,
}

/// Launcher that never spawns; counts calls and reports a scripted exit.
pub struct SpyRunner {
    calls: Cell<usize>,
    last: RefCell<Option<SpyCall>>,
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl SpyRunner {
    /// Spy that reports a clean exit with no output.
    pub fn new() -> Self {
        Self::with_exit(0, "", "")
    }

    pub fn with_exit(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            calls: Cell::new(0),
            last: RefCell::new(None),
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_request(&self) -> Option<SpyCall> {
        self.last.borrow().clone()
    }
}

impl Default for SpyRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRunner for SpyRunner {
    fn run(&self, request: &ScriptRequest) -> Result<CommandOutput> {
        self.calls.set(self.calls.get() + 1);
        *self.last.borrow_mut() = Some(SpyCall {
            request: request.clone(),
            contents: fs::read_to_string(&request.script_path).ok(),
        });
        Ok(CommandOutput {
            status: exit_status(self.exit_code),
            stdout: self.stdout.clone().into_bytes(),
            stderr: self.stderr.clone().into_bytes(),
            stdout_truncated: 0,
            stderr_truncated: 0,
            timed_out: false,
            elapsed: Duration::from_millis(1),
        })
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}
