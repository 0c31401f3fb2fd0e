use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_CONCURRENCY: usize = 32;

/// Which tiers run and how generation calls are scheduled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// When false no run is started at all
    pub enabled: bool,

    /// Tier 1: getting-started and architecture overviews
    pub project_level: bool,

    /// Tier 2: one artifact per module
    pub module_level: bool,

    /// Tier 3: class and free-function artifacts per file
    pub unit_level: bool,

    pub cross_references: bool,

    /// Ignore change detection and regenerate every unit
    pub force: bool,

    /// Worker pool size for tier 3
    pub concurrency: usize,

    /// Retry a failed generation call exactly once
    pub retry_failed: bool,

    pub max_tokens: u32,

    /// Upper bound on a single generation call
    pub call_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            project_level: true,
            module_level: true,
            unit_level: true,
            cross_references: true,
            force: false,
            concurrency: 3,
            retry_failed: true,
            max_tokens: 4000,
            call_timeout_secs: 600,
        }
    }
}

impl GenerationConfig {
    /// Pool size clamped to `1..=32`
    pub fn worker_count(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }

    /// Attempts per generation call: one, plus one retry when enabled
    pub fn attempts(&self) -> usize {
        if self.retry_failed {
            2
        } else {
            1
        }
    }
}
