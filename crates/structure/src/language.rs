use std::path::Path;

/// Kind of C/C++ source file, detected from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Header,
    Implementation,
    Unknown,
}

impl SourceKind {
    /// Detect kind from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "h" | "hh" | "hpp" | "hxx" | "inl" => SourceKind::Header,
            "c" | "cc" | "cpp" | "cxx" | "c++" => SourceKind::Implementation,
            _ => SourceKind::Unknown,
        }
    }

    /// Detect kind from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(SourceKind::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Header => "header",
            SourceKind::Implementation => "implementation",
            SourceKind::Unknown => "unknown",
        }
    }
}

/// Get Tree-sitter language instance for C++ sources
pub fn tree_sitter_cpp() -> tree_sitter::Language {
    tree_sitter_cpp::LANGUAGE.into()
}
