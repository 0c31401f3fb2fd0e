use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Module name used for files that sit directly under the project root
pub const ROOT_MODULE: &str = "root";

/// Structural model of a whole source tree, built once per run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectStructure {
    /// Canonical project root
    pub root: PathBuf,

    /// Every discovered source file, sorted
    pub files: Vec<PathBuf>,

    /// Modules in first-seen order of the sorted file list
    pub modules: Vec<Module>,

    /// Include summary sampled from the tree
    pub dependencies: DependencySummary,

    /// Bounded text rendering of the directory layout
    pub directory_tree: String,
}

impl ProjectStructure {
    /// Find the module owning `path`
    #[must_use]
    pub fn module_of(&self, path: &Path) -> Option<&Module> {
        self.modules
            .iter()
            .find(|module| module.files.iter().any(|file| file == path))
    }

    /// Look up a module by name
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name == name)
    }

    /// Path relative to the project root, falling back to the input path
    #[must_use]
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// A group of files sharing the same first path segment under the root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub name: String,

    /// Owning directory (the root itself for the `root` module)
    pub path: PathBuf,

    pub files: Vec<PathBuf>,

    /// Empty after a scan; filled by `StructureExtractor::hydrate_module`
    #[serde(default)]
    pub classes: Vec<ClassEntity>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Module {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            files: Vec::new(),
            classes: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// True when any member file is in `changed`
    pub fn touches(&self, changed: &HashSet<PathBuf>) -> bool {
        self.files.iter().any(|file| changed.contains(file))
    }
}

/// System vs. local include names found in a sample of the tree
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencySummary {
    /// Bracketed includes, reduced to their first path segment
    pub system: BTreeSet<String>,

    /// Quoted includes, capped
    pub local: BTreeSet<String>,
}

impl DependencySummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.local.is_empty()
    }
}

/// Result of parsing one source file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub classes: Vec<ClassEntity>,
    pub functions: Vec<FunctionEntity>,
    pub includes: Vec<String>,
}

impl FileInfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Whether there is anything worth documenting in this file
    #[must_use]
    pub fn has_entities(&self) -> bool {
        !self.classes.is_empty() || !self.functions.is_empty()
    }
}

/// A class or struct definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClassEntity {
    pub name: String,
    pub methods: Vec<MethodEntity>,
    pub base_classes: Vec<String>,

    /// Leading slice of the definition, bounded by `ExtractorConfig::class_snippet_chars`
    pub snippet: String,
}

/// A member function declared or defined inside a class body
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MethodEntity {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub visibility: Visibility,
    pub is_const: bool,
    pub is_static: bool,
    pub is_virtual: bool,
}

/// A free function definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FunctionEntity {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Type text as written, e.g. `const std::string&`
    pub ty: String,
    /// May be empty for unnamed parameters
    pub name: String,
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }

    /// Render as `type name`
    #[must_use]
    pub fn render(&self) -> String {
        if self.name.is_empty() {
            self.ty.clone()
        } else {
            format!("{} {}", self.ty, self.name)
        }
    }
}

/// Member access level
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Parse an access label such as `public` (trailing colon tolerated)
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().trim_end_matches(':').trim() {
            "public" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }
}

/// Render a parameter list as it would appear in a signature
#[must_use]
pub fn render_parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(Parameter::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncate `text` to at most `max_chars` characters on a char boundary
#[must_use]
pub fn bounded_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
