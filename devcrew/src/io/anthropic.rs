//! Anthropic Messages API provider (blocking).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::io::config::{ApiKey, ProviderConfig};
use crate::io::provider::{ProviderError, TextCompletionProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Completion backend that sends each prompt as a single user message.
pub struct AnthropicProvider {
    client: Client,
    config: ProviderConfig,
    api_key: ApiKey,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig, api_key: ApiKey) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }
}

impl TextCompletionProvider for AnthropicProvider {
    #[instrument(skip_all, fields(model = %self.config.model, prompt_len = prompt.len()))]
    fn complete(&self, prompt: &str, stop: &[String]) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            stop_sequences: (!stop.is_empty()).then_some(stop),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .map_err(|e| {
                warn!(err = %e, "anthropic request failed");
                ProviderError::Network(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        if !(200..300).contains(&status) {
            warn!(status, "anthropic returned error status");
            return Err(status_error(status, body));
        }

        let text = parse_response(&body)?;
        debug!(completion_len = text.len(), "anthropic completion received");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Authentication,
        429 => ProviderError::RateLimited,
        _ => ProviderError::Api {
            status,
            message: body,
        },
    }
}

/// Concatenate every text block of a Messages API response body.
fn parse_response(body: &str) -> Result<String, ProviderError> {
    let parsed: MessagesResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
    let text: String = parsed
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect();
    if text.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "response contained no text".to_string(),
        ));
    }
    Ok(text)
}
