//! # Autodoc Structure
//!
//! Best-effort structural model of a C++ source tree.
//!
//! ## Architecture
//!
//! ```text
//! Source Root
//!     │
//!     ├──> FileScanner (walkdir + include/exclude globs) → sorted file list
//!     │
//!     ├──> Module detection (first path segment, or "root")
//!     │
//!     ├──> Include sampling → DependencySummary (system / local)
//!     │
//!     └──> SourceParser (per file, on demand)
//!          ├─> GrammarParser  (tree-sitter-cpp)
//!          └─> LexicalParser  (regex + brace counting, fallback)
//! ```
//!
//! Both parsers produce the same [`FileInfo`] shape. A grammar failure on one
//! file downgrades that file to the lexical parser and never aborts a scan.
//!
//! ## Example
//!
//! ```no_run
//! use autodoc_structure::{ExtractorConfig, StructureExtractor};
//!
//! let extractor = StructureExtractor::new(ExtractorConfig::default()).unwrap();
//! let project = extractor.scan("path/to/project").unwrap();
//! for module in &project.modules {
//!     println!("{}: {} files", module.name, module.files.len());
//! }
//! ```

mod ast_analyzer;
mod config;
mod error;
mod extractor;
mod filters;
mod language;
mod lexical;
mod parser;
mod scanner;
mod types;

pub use ast_analyzer::GrammarParser;
pub use config::{ExtractorConfig, ParserPreference};
pub use error::{Result, StructureError};
pub use extractor::StructureExtractor;
pub use filters::PathFilter;
pub use language::SourceKind;
pub use lexical::LexicalParser;
pub use parser::{ParserKind, SourceParser};
pub use scanner::FileScanner;
pub use types::{
    bounded_snippet, render_parameters, ClassEntity, DependencySummary, FileInfo, FunctionEntity,
    MethodEntity, Module, Parameter, ProjectStructure, Visibility, ROOT_MODULE,
};
