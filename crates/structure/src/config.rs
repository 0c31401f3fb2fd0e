use serde::{Deserialize, Serialize};

/// Which `SourceParser` variant the extractor should use
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParserPreference {
    /// Grammar-aware when the grammar loads, lexical otherwise
    #[default]
    Auto,
    /// Force the grammar-aware parser (still falls back per file on failure)
    Grammar,
    /// Force the lexical scanner
    Lexical,
}

/// Configuration for structure extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Glob patterns (relative to the root) selecting source files
    pub include_patterns: Vec<String>,

    /// Glob or substring patterns removing files from the selection
    pub exclude_patterns: Vec<String>,

    pub parser: ParserPreference,

    /// Maximum characters of class source kept as context
    pub class_snippet_chars: usize,

    /// Maximum characters of function source kept as context
    pub function_snippet_chars: usize,

    /// Number of files sampled for include detection
    pub dependency_sample_files: usize,

    /// Cap on the number of local includes reported
    pub max_local_dependencies: usize,

    /// Files shown in the directory tree summary
    pub tree_max_files: usize,

    /// Files listed per directory in the directory tree summary
    pub tree_files_per_dir: usize,

    /// Member files parsed when hydrating a module
    pub module_sample_files: usize,

    /// Skip files larger than this many bytes
    pub max_file_bytes: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec![
                "**/*.h".to_string(),
                "**/*.hpp".to_string(),
                "**/*.cpp".to_string(),
            ],
            exclude_patterns: vec![
                "**/build/**".to_string(),
                "**/third_party/**".to_string(),
                "**/external/**".to_string(),
            ],
            parser: ParserPreference::Auto,
            class_snippet_chars: 500,
            function_snippet_chars: 300,
            dependency_sample_files: 100,
            max_local_dependencies: 20,
            tree_max_files: 50,
            tree_files_per_dir: 5,
            module_sample_files: 20,
            max_file_bytes: 1_048_576,
        }
    }
}

impl ExtractorConfig {
    /// Config that never touches the grammar
    pub fn lexical() -> Self {
        Self {
            parser: ParserPreference::Lexical,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: ExtractorConfig = toml::from_str(
            r#"
include_patterns = ["src/**/*.h"]
parser = "lexical"
"#,
        )
        .unwrap();
        assert_eq!(cfg.include_patterns, vec!["src/**/*.h".to_string()]);
        assert_eq!(cfg.parser, ParserPreference::Lexical);
        assert_eq!(cfg.class_snippet_chars, 500);
        assert_eq!(cfg.exclude_patterns.len(), 3);
    }
}
