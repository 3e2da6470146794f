//! Text completion abstraction used by code generation and the agent crew.
//!
//! The [`TextCompletionProvider`] trait decouples the pipeline from the actual
//! LLM backend (currently the Anthropic Messages API). Tests use scripted
//! providers that return predetermined text without touching the network.

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::io::prompt::PromptEngine;

/// Failure kinds surfaced by a completion backend.
///
/// Callers treat every kind as one opaque failure; the split exists for logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("authentication failed")]
    Authentication,
    #[error("rate limited")]
    RateLimited,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
}

/// Synchronous "prompt in, text out" capability.
pub trait TextCompletionProvider {
    /// Complete `prompt`, stopping early at any of `stop` when non-empty.
    fn complete(&self, prompt: &str, stop: &[String]) -> Result<String, ProviderError>;
}

impl<P: TextCompletionProvider + ?Sized> TextCompletionProvider for &P {
    fn complete(&self, prompt: &str, stop: &[String]) -> Result<String, ProviderError> {
        (**self).complete(prompt, stop)
    }
}

/// Turns an operator requirement into source text with a single completion.
pub struct CodeGenerator<'a, P: ?Sized> {
    provider: &'a P,
    prompts: &'a PromptEngine,
}

impl<'a, P: TextCompletionProvider + ?Sized> CodeGenerator<'a, P> {
    pub fn new(provider: &'a P, prompts: &'a PromptEngine) -> Self {
        Self { provider, prompts }
    }

    /// Generate code for `requirement`. No retry on provider failure.
    #[instrument(skip_all, fields(requirement_len = requirement.len()))]
    pub fn generate(&self, requirement: &str) -> Result<String> {
        let prompt = self.prompts.render_generate(requirement)?;
        let code = self
            .provider
            .complete(&prompt, &[])
            .context("code generation request")?;
        debug!(code_len = code.len(), "code generated");
        Ok(code)
    }
}
