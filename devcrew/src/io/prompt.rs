//! Prompt templates for code generation and agent tasks.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::agents::Agent;

const GENERATE_TEMPLATE: &str = include_str!("prompts/generate.md");
const FIX_ERRORS_TEMPLATE: &str = include_str!("prompts/fix_errors.md");
const AGENT_TASK_TEMPLATE: &str = include_str!("prompts/agent_task.md");

/// Task-specific inputs for an agent prompt.
#[derive(Debug, Clone, Default)]
pub struct TaskPromptInputs<'a> {
    pub description: &'a str,
    pub expected_output: &'a str,
    /// Operator requirement the crew is working on.
    pub requirement: Option<&'a str>,
    /// Code under discussion.
    pub code: Option<&'a str>,
    /// Output of the task that ran before this one.
    pub previous: Option<&'a str>,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("generate", GENERATE_TEMPLATE)
            .context("load generate template")?;
        env.add_template("fix_errors", FIX_ERRORS_TEMPLATE)
            .context("load fix_errors template")?;
        env.add_template("agent_task", AGENT_TASK_TEMPLATE)
            .context("load agent_task template")?;
        Ok(Self { env })
    }

    pub fn render_generate(&self, requirement: &str) -> Result<String> {
        let template = self.env.get_template("generate")?;
        Ok(template.render(context! { requirement => requirement })?)
    }

    pub fn render_fix_errors(&self, errors: &str) -> Result<String> {
        let template = self.env.get_template("fix_errors")?;
        Ok(template.render(context! { errors => errors })?)
    }

    pub fn render_agent_task(&self, agent: &Agent, inputs: &TaskPromptInputs<'_>) -> Result<String> {
        let template = self.env.get_template("agent_task")?;
        let rendered = template.render(context! {
            agent => agent,
            task => context! {
                description => inputs.description.trim(),
                expected_output => inputs.expected_output.trim(),
            },
            requirement => non_blank(inputs.requirement),
            code => non_blank(inputs.code),
            previous => non_blank(inputs.previous),
        })?;
        Ok(rendered)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::roster::junior_developer;

    #[test]
    fn generate_prompt_matches_reference_wording() {
        let engine = PromptEngine::new().expect("engine");
        assert_eq!(
            engine.render_generate("add two numbers").expect("render"),
            "Generate Python code for the following prompt: add two numbers"
        );
    }

    #[test]
    fn fix_prompt_embeds_errors() {
        let engine = PromptEngine::new().expect("engine");
        let rendered = engine
            .render_fix_errors("Execution Error: boom")
            .expect("render");
        assert_eq!(
            rendered,
            "Generate a new prompt to fix these errors: Execution Error: boom"
        );
    }

    #[test]
    fn agent_task_includes_persona_and_optional_sections() {
        let engine = PromptEngine::new().expect("engine");
        let agent = junior_developer();
        let rendered = engine
            .render_agent_task(
                &agent,
                &TaskPromptInputs {
                    description: "Write it",
                    expected_output: "Code",
                    requirement: Some("  sort a list "),
                    code: None,
                    previous: Some("   "),
                },
            )
            .expect("render");

        assert!(rendered.contains("You are Velibor, Junior Developer."));
        assert!(rendered.contains("<task>\nWrite it\n</task>"));
        assert!(rendered.contains("<requirement>\nsort a list\n</requirement>"));
        assert!(!rendered.contains("<generated_code>"));
        assert!(!rendered.contains("<previous_task_output>"));
    }

    #[test]
    fn code_is_not_html_escaped() {
        let engine = PromptEngine::new().expect("engine");
        let rendered = engine
            .render_agent_task(
                &junior_developer(),
                &TaskPromptInputs {
                    description: "Review",
                    expected_output: "Review",
                    code: Some("if a < b and c > d: print(\"&\")"),
                    ..TaskPromptInputs::default()
                },
            )
            .expect("render");
        assert!(rendered.contains("if a < b and c > d: print(\"&\")"));
    }
}
