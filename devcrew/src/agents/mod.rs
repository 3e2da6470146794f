//! Agent personas and the sequential crew that drives them.
//!
//! Agents are descriptions, not processes: each task renders the agent's
//! persona into a prompt and makes one call to a
//! [`TextCompletionProvider`]. Nothing here knows which backend is used.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::io::prompt::{PromptEngine, TaskPromptInputs};
use crate::io::provider::TextCompletionProvider;

pub mod crew;
pub mod roster;

/// A named role with a goal and backstory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Agent {
    /// Perform one task as this agent with a single completion call.
    #[instrument(skip_all, fields(agent = %self.name))]
    pub fn perform<P: TextCompletionProvider + ?Sized>(
        &self,
        provider: &P,
        prompts: &PromptEngine,
        inputs: &TaskPromptInputs<'_>,
    ) -> Result<String> {
        let prompt = prompts.render_agent_task(self, inputs)?;
        let output = provider
            .complete(&prompt, &[])
            .with_context(|| format!("{} completion", self.role))?;
        debug!(output_len = output.len(), "agent task completed");
        Ok(output)
    }

    /// Ask this agent for a corrective prompt addressing `errors`.
    ///
    /// The suggestion is returned for the operator; it is never executed.
    pub fn suggest_fix_prompt<P: TextCompletionProvider + ?Sized>(
        &self,
        provider: &P,
        prompts: &PromptEngine,
        errors: &str,
    ) -> Result<String> {
        let instruction = prompts.render_fix_errors(errors)?;
        self.perform(
            provider,
            prompts,
            &TaskPromptInputs {
                description: &instruction,
                expected_output: "A revised prompt for the developer that avoids these errors",
                ..TaskPromptInputs::default()
            },
        )
    }
}
