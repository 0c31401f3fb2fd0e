use crate::ast_analyzer::GrammarParser;
use crate::config::{ExtractorConfig, ParserPreference};
use crate::error::Result;
use crate::lexical::LexicalParser;
use crate::types::FileInfo;
use std::path::Path;

/// Capability shared by the grammar-aware and lexical strategies.
///
/// Both variants must return the same `FileInfo` shape so callers stay
/// strategy-agnostic.
pub trait SourceParser: Send + Sync {
    /// Short identifier used in logs
    fn kind(&self) -> ParserKind;

    /// Extract classes, free functions and includes from `content`
    fn parse(&self, path: &Path, content: &str) -> Result<FileInfo>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Grammar,
    Lexical,
}

impl ParserKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::Lexical => "lexical",
        }
    }
}

/// Pick the primary parser by probing whether the grammar loads
pub(crate) fn select_parser(config: &ExtractorConfig) -> Box<dyn SourceParser> {
    match config.parser {
        ParserPreference::Lexical => Box::new(LexicalParser::new(config)),
        ParserPreference::Auto | ParserPreference::Grammar => match GrammarParser::new(config) {
            Ok(parser) => {
                log::info!("Tree-sitter C++ parser initialized");
                Box::new(parser)
            }
            Err(err) => {
                log::warn!("Tree-sitter not available ({err}), using lexical parser");
                Box::new(LexicalParser::new(config))
            }
        },
    }
}
