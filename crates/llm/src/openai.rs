use crate::error::{LlmError, Result};
use crate::generator::{TextGenerator, SYSTEM_PROMPT};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat-completions endpoint shared by OpenAI, Ollama and LM Studio
pub struct OpenAiCompatibleGenerator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    id: String,
    timeout: Duration,
}

impl OpenAiCompatibleGenerator {
    pub fn new(
        provider: &str,
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        let model = model.into();
        log::info!(
            "Initialized {provider} generator with model: {model} at {base_url}, timeout: {timeout:?}"
        );
        Ok(Self {
            client,
            endpoint: format!("{base_url}/chat/completions"),
            api_key,
            id: format!("{provider}:{model}"),
            model,
            timeout,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub(crate) fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {e}")))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("Empty completion".to_string()))
}

fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: max_output_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
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
        parse_chat_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_choice() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hello"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Hello");
    }

    #[test]
    fn null_content_is_invalid() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(
            parse_chat_response(body),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(parse_chat_response("<html>").is_err());
        assert_eq!(
            parse_error_message(r#"{"error":{"message":"model not found"}}"#),
            "model not found"
        );
    }
}
