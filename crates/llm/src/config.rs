use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable consulted for any provider before the provider-specific one
pub const GENERIC_API_KEY_ENV: &str = "AUTODOC_LLM_API_KEY";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    OpenAi,
    Ollama,
    LmStudio,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [Self::Anthropic, Self::OpenAi, Self::Ollama, Self::LmStudio];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::LmStudio => "lmstudio",
        }
    }

    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::OpenAi => "gpt-4",
            Self::Ollama => "llama3",
            Self::LmStudio => "local-model",
        }
    }

    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
            Self::LmStudio => "http://localhost:1234/v1",
        }
    }

    /// Hosted providers refuse to start without a key
    pub const fn requires_api_key(self) -> bool {
        matches!(self, Self::Anthropic | Self::OpenAi)
    }

    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Ollama | Self::LmStudio => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                LlmError::Configuration(format!(
                    "Unknown provider '{s}' (expected anthropic, openai, ollama or lmstudio)"
                ))
            })
    }
}

/// Provider selection and per-call limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ProviderKind,

    /// Defaults to the provider's model when unset
    pub model: Option<String>,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Overrides the provider endpoint
    pub base_url: Option<String>,

    /// HTTP timeout for one request
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: 600,
        }
    }
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Key from the config, then the generic env var, then the provider's env var
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        let non_empty = |key: String| (!key.trim().is_empty()).then_some(key);
        self.api_key
            .clone()
            .and_then(non_empty)
            .or_else(|| lookup(GENERIC_API_KEY_ENV).and_then(non_empty))
            .or_else(|| {
                self.provider
                    .api_key_env()
                    .and_then(|name| lookup(name))
                    .and_then(non_empty)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn provider_defaults() {
        let config = LlmConfig {
            provider: ProviderKind::Ollama,
            ..Default::default()
        };
        assert_eq!(config.model(), "llama3");
        assert_eq!(config.base_url(), "http://localhost:11434/v1");
        assert_eq!(config.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("LMStudio".parse::<ProviderKind>().unwrap(), ProviderKind::LmStudio);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert!("bard".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn api_key_precedence() {
        let env = |name: &str| match name {
            "OPENAI_API_KEY" => Some("from-provider-env".to_string()),
            _ => None,
        };
        let mut config = LlmConfig {
            provider: ProviderKind::OpenAi,
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key_with(env).as_deref(), Some("from-provider-env"));

        config.api_key = Some("from-file".to_string());
        assert_eq!(config.resolve_api_key_with(env).as_deref(), Some("from-file"));

        config.api_key = Some("  ".to_string());
        let generic = |name: &str| (name == GENERIC_API_KEY_ENV).then(|| "generic".to_string());
        assert_eq!(config.resolve_api_key_with(generic).as_deref(), Some("generic"));
    }

    #[test]
    fn toml_section_round_trips_without_key() {
        let config: LlmConfig = toml::from_str(
            r#"
provider = "lmstudio"
model = "qwen"
api_key = "secret"
"#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::LmStudio);
        assert_eq!(config.model(), "qwen");
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }
}
