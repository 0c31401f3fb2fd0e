use thiserror::Error;

/// Result type for structure extraction
pub type Result<T> = std::result::Result<T, StructureError>;

/// Errors that can occur while extracting project structure
#[derive(Error, Debug)]
pub enum StructureError {
    /// The source root is missing or not a directory
    #[error("Invalid source root: {0}")]
    InvalidRoot(String),

    /// A grammar-aware parse failed (callers downgrade to the lexical parser)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The grammar could not be loaded into a parser
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// An include/exclude pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StructureError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}
