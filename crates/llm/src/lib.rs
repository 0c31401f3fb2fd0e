//! # Autodoc LLM
//!
//! One [`TextGenerator`] interface over four providers:
//!
//! | provider   | API                          | key required |
//! |------------|------------------------------|--------------|
//! | `anthropic`| messages                     | yes          |
//! | `openai`   | chat completions             | yes          |
//! | `ollama`   | chat completions (local)     | no           |
//! | `lmstudio` | chat completions (local)     | no           |
//!
//! Every request carries a timeout and errors are classified as transient or
//! permanent via [`LlmError::is_transient`].

mod anthropic;
mod config;
mod error;
mod generator;
mod openai;

pub use anthropic::AnthropicGenerator;
pub use config::{LlmConfig, ProviderKind, GENERIC_API_KEY_ENV};
pub use error::{LlmError, Result};
pub use generator::{TextGenerator, SYSTEM_PROMPT};
pub use openai::OpenAiCompatibleGenerator;

use std::sync::Arc;

/// Build the configured provider; fails before any work when a hosted provider has no key
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>> {
    let api_key = config.resolve_api_key();
    build_generator_with_key(config, api_key)
}

pub fn build_generator_with_key(
    config: &LlmConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn TextGenerator>> {
    let provider = config.provider;
    if provider.requires_api_key() && api_key.is_none() {
        return Err(missing_key(provider));
    }

    let generator: Arc<dyn TextGenerator> = match provider {
        ProviderKind::Anthropic => {
            let key = api_key.ok_or_else(|| missing_key(provider))?;
            Arc::new(AnthropicGenerator::new(
                config.base_url(),
                key,
                config.model(),
                config.timeout(),
            )?)
        }
        ProviderKind::OpenAi | ProviderKind::Ollama | ProviderKind::LmStudio => {
            Arc::new(OpenAiCompatibleGenerator::new(
                provider.as_str(),
                config.base_url(),
                api_key,
                config.model(),
                config.timeout(),
            )?)
        }
    };
    Ok(generator)
}

fn missing_key(provider: ProviderKind) -> LlmError {
    let hint = provider
        .api_key_env()
        .map(|name| format!(" (set {name} or {GENERIC_API_KEY_ENV})"))
        .unwrap_or_default();
    LlmError::Configuration(format!("API key required for {provider}{hint}"))
}
