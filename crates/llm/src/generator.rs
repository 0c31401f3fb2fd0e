use crate::error::Result;
use async_trait::async_trait;

/// System message sent to chat-style providers
pub const SYSTEM_PROMPT: &str =
    "You are a technical documentation expert specializing in C++ code documentation.";

/// Black-box text generation: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Stable identifier (provider and model) mixed into generation keys
    fn id(&self) -> &str;

    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;
}
