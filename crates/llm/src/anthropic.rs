use crate::error::{LlmError, Result};
use crate::generator::TextGenerator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API
pub struct AnthropicGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    id: String,
    timeout: Duration,
}

impl AnthropicGenerator {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        let model = model.into();
        log::info!("Initialized Anthropic generator with model: {model}, timeout: {timeout:?}");
        Ok(Self {
            client,
            endpoint: format!("{base_url}/messages"),
            api_key,
            id: format!("anthropic:{model}"),
            model,
            timeout,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Concatenate the text blocks of a messages API response
pub(crate) fn parse_messages_response(body: &str) -> Result<String> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {e}")))?;
    let text: String = response
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect();
    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("Empty completion".to_string()));
    }
    Ok(text)
}

pub(crate) fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: max_output_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
                message: parse_error_message(&text),
            });
        }
        parse_messages_response(&text)
    }
}
