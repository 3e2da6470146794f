//! Orchestration for a single `devcrew run` session.
//!
//! Stages run strictly in order: requirement intake, code generation,
//! artifact save, crew review, sandboxed execution, and (on execution errors)
//! a corrective-prompt suggestion. [`Pipeline::run_session`] is the only
//! recovery boundary: any stage error is logged, appended to the transcript,
//! shown to the operator, and turned into [`SessionOutcome::Failed`].

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info, instrument, warn};

use crate::agents::crew::{Crew, CrewContext};
use crate::core::types::{ExecutionResult, SessionOutcome};
use crate::io::artifact::write_artifact;
use crate::io::console::Operator;
use crate::io::prompt::PromptEngine;
use crate::io::provider::{CodeGenerator, TextCompletionProvider};
use crate::io::sandbox::{InterpreterRunner, Sandbox, ScriptRunner};
use crate::io::transcript::{Transcript, labels};

/// Every collaborator a session needs, built once by the entry point.
pub struct Pipeline<P, R = InterpreterRunner> {
    pub provider: P,
    pub prompts: PromptEngine,
    pub crew: Crew,
    pub sandbox: Sandbox<R>,
    pub transcript: Transcript,
    /// Well-known file the generated code is saved to.
    pub artifact_path: PathBuf,
}

impl<P: TextCompletionProvider, R: ScriptRunner> Pipeline<P, R> {
    /// Run one session end to end. Never returns an error.
    #[instrument(skip_all)]
    pub fn run_session<O: Operator>(&self, operator: &mut O) -> SessionOutcome {
        info!("Starting the Code Generation and Verification System");
        operator.say("Welcome to the Code Generation and Verification System");

        match self.run_stages(operator) {
            Ok(result) => SessionOutcome::Completed(result),
            Err(err) => {
                let message = format!("An error occurred: {err:#}");
                operator.say(&message);
                error!("{message}");
                if let Err(log_err) = self.transcript.append_raw(&message) {
                    error!(err = %format!("{log_err:#}"), "failed to record error in transcript");
                }
                SessionOutcome::Failed { message }
            }
        }
    }

    fn run_stages<O: Operator>(&self, operator: &mut O) -> Result<ExecutionResult> {
        let requirement = operator.requirement()?;
        self.transcript.append(labels::PROMPT, &requirement)?;

        let code = CodeGenerator::new(&self.provider, &self.prompts).generate(&requirement)?;
        self.transcript.append_block(labels::GENERATED_CODE, &code)?;

        write_artifact(&self.artifact_path, &code)?;
        let saved = format!(
            "Code generated and saved to {}",
            self.artifact_path.display()
        );
        operator.say(&format!("\n{saved}"));
        info!("{saved}");

        info!("Starting crew tasks");
        let review = self.crew.kickoff(
            &self.provider,
            &self.prompts,
            CrewContext {
                requirement: &requirement,
                code: &code,
            },
        )?;
        info!("Crew tasks completed");
        self.transcript
            .append_block(labels::CREW_RESULTS, review.final_output())?;

        let mut gate = |code: &str| operator.confirm_execution(code);
        let report = self.sandbox.execute(&code, &mut gate);
        if let Some(elapsed) = report.elapsed {
            info!(
                elapsed_ms = elapsed.as_millis() as u64,
                outcome = report.result.kind(),
                "sandbox run finished"
            );
        }
        let result = report.result;
        self.transcript
            .append_block(labels::EXECUTION_RESULT, &result.to_string())?;

        match &result {
            ExecutionResult::Aborted => operator.say("Code execution aborted."),
            ExecutionResult::Success { stdout } => {
                if !stdout.is_empty() {
                    operator.say(&format!("\nOutput:\n{}", stdout.trim_end()));
                }
                operator.say("\nCode executed successfully.");
                info!("Code executed successfully");
            }
            failed => {
                operator.say(&format!("\nErrors detected: {failed}"));
                warn!("Errors detected in code execution: {failed}");
                operator.say("Generating new prompt based on errors...");
                let new_prompt = self.crew.reviewer().suggest_fix_prompt(
                    &self.provider,
                    &self.prompts,
                    &failed.to_string(),
                )?;
                self.transcript.append(labels::NEW_PROMPT, &new_prompt)?;
                operator.say(&format!("New prompt generated: {new_prompt}"));
            }
        }

        Ok(result)
    }
}
