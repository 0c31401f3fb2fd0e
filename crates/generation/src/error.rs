use autodoc_llm::LlmError;
use autodoc_structure::StructureError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Unusable settings; the run aborts before any work starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `generation.enabled = false`
    #[error("Generation is disabled")]
    Disabled,

    /// The source root could not be scanned at all
    #[error("Cannot read source root: {0}")]
    SourceRoot(#[source] StructureError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    CacheError(#[from] autodoc_cache::CacheError),

    #[error("Generation failed: {0}")]
    LlmError(#[source] LlmError),

    #[error("Background task failed: {0}")]
    TaskError(String),
}

impl GenerationError {
    /// Errors that abort the whole run rather than a single unit
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Disabled | Self::SourceRoot(_) | Self::TaskError(_)
        )
    }
}

impl From<StructureError> for GenerationError {
    fn from(err: StructureError) -> Self {
        match err {
            StructureError::InvalidPattern { .. } => Self::Configuration(err.to_string()),
            other => Self::SourceRoot(other),
        }
    }
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(message) => Self::Configuration(message),
            other => Self::LlmError(other),
        }
    }
}

impl From<tokio::task::JoinError> for GenerationError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_errors_become_configuration() {
        let err = GenerationError::from(LlmError::Configuration("no API key".to_string()));
        assert!(matches!(&err, GenerationError::Configuration(message) if message == "no API key"));
        assert!(err.is_fatal());

        let err = GenerationError::from(StructureError::InvalidPattern {
            pattern: "[".to_string(),
            message: "unclosed class".to_string(),
        });
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn call_failures_stay_per_unit() {
        let err = GenerationError::from(LlmError::Http {
            status: 503,
            message: "overloaded".to_string(),
        });
        assert!(matches!(err, GenerationError::LlmError(_)));
        assert!(!err.is_fatal());

        let err = GenerationError::from(StructureError::InvalidRoot("/missing".to_string()));
        assert!(matches!(err, GenerationError::SourceRoot(_)));
    }
}
