//! Operator interaction: requirement intake, execution confirmation, messages.
//!
//! The [`Operator`] trait keeps the pipeline headless-testable; the console
//! implementation is the only place that blocks on terminal input.

use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use tracing::warn;

use crate::core::confirm::is_affirmative;

/// Everything the pipeline needs from the human in the loop.
pub trait Operator {
    /// Free-text requirement for this run.
    fn requirement(&mut self) -> Result<String>;
    /// Decide whether `code` may run. Only an explicit yes returns `true`.
    fn confirm_execution(&mut self, code: &str) -> bool;
    /// Show a line of output.
    fn say(&mut self, message: &str);
}

/// Terminal operator backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct ConsoleOperator {
    preset_requirement: Option<String>,
    auto_confirm: bool,
}

impl ConsoleOperator {
    /// `preset_requirement` skips the requirement question; `auto_confirm`
    /// answers yes to the execution question.
    pub fn new(preset_requirement: Option<String>, auto_confirm: bool) -> Self {
        Self {
            preset_requirement,
            auto_confirm,
        }
    }
}

impl Operator for ConsoleOperator {
    fn requirement(&mut self) -> Result<String> {
        if let Some(requirement) = self.preset_requirement.take() {
            return Ok(requirement);
        }
        println!("Please enter the requirements for the Senior Developer (CTO):");
        Input::<String>::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()
            .context("read requirement")
    }

    fn confirm_execution(&mut self, code: &str) -> bool {
        println!("{}", style("Generated code:").bold());
        println!("{code}");

        if self.auto_confirm {
            println!("  {} (--yes flag)", style("Auto-approved").dim());
            return true;
        }

        match Input::<String>::new()
            .with_prompt("Do you want to execute this code? (yes/no)")
            .allow_empty(true)
            .interact_text()
        {
            Ok(answer) => is_affirmative(&answer),
            Err(err) => {
                warn!(err = %err, "failed to read confirmation, treating as no");
                false
            }
        }
    }

    fn say(&mut self, message: &str) {
        println!("{message}");
    }
}
