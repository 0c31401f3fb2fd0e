use anyhow::{Context, Result};
use autodoc_generation::GenerationConfig;
use autodoc_llm::{LlmConfig, ProviderKind};
use autodoc_structure::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "autodoc.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".cache/autodoc"),
            enabled: true,
        }
    }
}

/// Everything `autodoc` reads from its TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutodocConfig {
    /// C++ tree to document
    pub source_root: PathBuf,

    /// Where markdown artifacts are written
    pub output_dir: PathBuf,

    pub extractor: ExtractorConfig,
    pub cache: CacheSettings,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
}

impl Default for AutodocConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            output_dir: PathBuf::from("generated"),
            extractor: ExtractorConfig::default(),
            cache: CacheSettings::default(),
            llm: LlmConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Command-line values that win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub force: bool,
    pub no_cache: bool,
    pub concurrency: Option<usize>,
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
}

impl AutodocConfig {
    /// Read `explicit`, or `autodoc.toml` in the working directory, or fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(root) = overrides.source_root {
            self.source_root = root;
        }
        if let Some(output) = overrides.output_dir {
            self.output_dir = output;
        }
        if overrides.force {
            self.generation.force = true;
        }
        if overrides.no_cache {
            self.cache.enabled = false;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.generation.concurrency = concurrency;
        }
        if let Some(provider) = overrides.provider {
            if provider != self.llm.provider {
                // Model and endpoint from the file belong to the old provider
                self.llm.model = None;
                self.llm.base_url = None;
            }
            self.llm.provider = provider;
        }
        if let Some(model) = overrides.model {
            self.llm.model = Some(model);
        }
    }
}
