use crate::config::ExtractorConfig;
use crate::error::{Result, StructureError};
use crate::filters::PathFilter;
use crate::lexical::{LexicalParser, INCLUDE_RE};
use crate::parser::{select_parser, ParserKind, SourceParser};
use crate::scanner::FileScanner;
use crate::types::{DependencySummary, FileInfo, Module, ProjectStructure, ROOT_MODULE};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// System headers too common to be worth reporting as dependencies
const UBIQUITOUS_SYSTEM_INCLUDES: &[&str] = &["std", "cstdlib", "iostream", "string", "vector", "map"];

/// Builds a `ProjectStructure` from a source tree and parses individual files
pub struct StructureExtractor {
    config: ExtractorConfig,
    filter: PathFilter,
    primary: Box<dyn SourceParser>,
    fallback: LexicalParser,
}

impl StructureExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let filter = PathFilter::new(&config.include_patterns, &config.exclude_patterns)?;
        let primary = select_parser(&config);
        let fallback = LexicalParser::new(&config);
        Ok(Self {
            config,
            filter,
            primary,
            fallback,
        })
    }

    /// Which parser handles files first
    pub fn parser_kind(&self) -> ParserKind {
        self.primary.kind()
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Discover files, group them into modules and sample their includes
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<ProjectStructure> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(StructureError::InvalidRoot(root.display().to_string()));
        }
        let root = root
            .canonicalize()
            .map_err(|err| StructureError::InvalidRoot(format!("{}: {err}", root.display())))?;

        log::info!("Scanning C++ project at {}", root.display());
        let files = FileScanner::new(&root, &self.filter, self.config.max_file_bytes).scan();

        let modules = detect_modules(&root, &files);
        let directory_tree = self.directory_tree(&root, &files);
        let dependencies = self.detect_dependencies(&files);

        log::info!(
            "Project structure: {} files, {} modules",
            files.len(),
            modules.len()
        );

        Ok(ProjectStructure {
            root,
            files,
            modules,
            dependencies,
            directory_tree,
        })
    }

    /// Parse one file; `None` when it cannot be read
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Option<FileInfo> {
        let path = path.as_ref();
        let content = read_source(path)?;
        self.parse_content(path, &content)
    }

    fn parse_content(&self, path: &Path, content: &str) -> Option<FileInfo> {
        match self.primary.parse(path, content) {
            Ok(info) => Some(info),
            Err(err) if self.primary.kind() != ParserKind::Lexical => {
                log::warn!(
                    "{} parse failed for {} ({err}), falling back to lexical parser",
                    self.primary.kind().as_str(),
                    path.display()
                );
                self.lexical_parse(path, content)
            }
            Err(err) => {
                log::warn!("Failed to parse {}: {err}", path.display());
                None
            }
        }
    }

    fn lexical_parse(&self, path: &Path, content: &str) -> Option<FileInfo> {
        match self.fallback.parse(path, content) {
            Ok(info) => Some(info),
            Err(err) => {
                log::warn!("Lexical parse failed for {}: {err}", path.display());
                None
            }
        }
    }

    /// Owned copy of `module` with classes and local includes filled in from a sample of its files
    pub fn hydrate_module(&self, module: &Module) -> Module {
        let mut hydrated = module.clone();
        let mut dependencies = BTreeSet::new();

        for file in module.files.iter().take(self.config.module_sample_files) {
            let Some(content) = read_source(file) else {
                continue;
            };
            dependencies.extend(
                INCLUDE_RE
                    .captures_iter(&content)
                    .filter(|caps| &caps[1] == "\"")
                    .map(|caps| caps[2].trim().to_string()),
            );
            if let Some(info) = self.parse_content(file, &content) {
                hydrated.classes.extend(info.classes);
            }
        }

        hydrated.dependencies = dependencies.into_iter().collect();
        hydrated
    }

    fn detect_dependencies(&self, files: &[PathBuf]) -> DependencySummary {
        let mut summary = DependencySummary::default();
        let mut local = BTreeSet::new();

        for file in files.iter().take(self.config.dependency_sample_files) {
            let Ok(bytes) = fs::read(file) else {
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            for caps in INCLUDE_RE.captures_iter(&content) {
                let name = caps[2].trim();
                if &caps[1] == "<" {
                    let base = name.split('/').next().unwrap_or(name);
                    if !UBIQUITOUS_SYSTEM_INCLUDES.contains(&base) {
                        summary.system.insert(base.to_string());
                    }
                } else {
                    local.insert(name.to_string());
                }
            }
        }

        summary.local = local
            .into_iter()
            .take(self.config.max_local_dependencies)
            .collect();
        summary
    }

    fn directory_tree(&self, root: &Path, files: &[PathBuf]) -> String {
        render_directory_tree(
            root,
            files,
            self.config.tree_max_files,
            self.config.tree_files_per_dir,
        )
    }
}

/// Group files by their first path segment under `root`
fn detect_modules(root: &Path, files: &[PathBuf]) -> Vec<Module> {
    let mut modules: Vec<Module> = Vec::new();

    for file in files {
        let Ok(relative) = file.strip_prefix(root) else {
            continue;
        };
        let mut components = relative.components();
        let first = components.next();
        let name = match (first, components.next()) {
            (Some(Component::Normal(dir)), Some(_)) => dir.to_string_lossy().into_owned(),
            _ => ROOT_MODULE.to_string(),
        };

        let index = match modules.iter().position(|module| module.name == name) {
            Some(index) => index,
            None => {
                let path = if name == ROOT_MODULE {
                    root.to_path_buf()
                } else {
                    root.join(&name)
                };
                modules.push(Module::new(name, path));
                modules.len() - 1
            }
        };
        modules[index].files.push(file.clone());
    }

    modules
}

/// Text tree of at most `max_files` files, `per_dir` listed per directory
fn render_directory_tree(root: &Path, files: &[PathBuf], max_files: usize, per_dir: usize) -> String {
    let mut dirs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in files.iter().take(max_files) {
        let Ok(relative) = file.strip_prefix(root) else {
            continue;
        };
        let dir = relative
            .parent()
            .map(|parent| parent.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        let name = relative
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        dirs.entry(dir).or_default().push(name);
    }

    let mut lines = Vec::new();
    for (dir, mut names) in dirs {
        if dir.is_empty() {
            lines.push(".".to_string());
        } else {
            lines.push(format!("{dir}/"));
        }
        names.sort();
        for name in names.iter().take(per_dir) {
            lines.push(format!("  {name}"));
        }
        if names.len() > per_dir {
            lines.push(format!("  ... and {} more files", names.len() - per_dir));
        }
    }

    let mut tree = lines.join("\n");
    if files.len() > max_files {
        let _ = write!(tree, "\n\n... and {} more files not shown", files.len() - max_files);
    }
    tree
}

fn read_source(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) => {
            log::warn!("Cannot read {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn modules_group_by_first_segment() {
        let root = Path::new("/p");
        let files = vec![
            PathBuf::from("/p/a/Foo.h"),
            PathBuf::from("/p/a/deep/Bar.h"),
            PathBuf::from("/p/main.cpp"),
            PathBuf::from("/p/b/Baz.h"),
        ];
        let modules = detect_modules(root, &files);
        let names: Vec<_> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", ROOT_MODULE, "b"]);
        assert_eq!(modules[0].files.len(), 2);
        assert_eq!(modules[0].path, PathBuf::from("/p/a"));
        assert_eq!(modules[1].path, PathBuf::from("/p"));
    }

    #[test]
    fn directory_tree_is_bounded() {
        let root = Path::new("/p");
        let mut files: Vec<PathBuf> = (0..7).map(|i| PathBuf::from(format!("/p/core/f{i}.h"))).collect();
        files.push(PathBuf::from("/p/main.cpp"));

        let tree = render_directory_tree(root, &files, 6, 5);
        assert_eq!(
            tree,
            "core/\n  f0.h\n  f1.h\n  f2.h\n  f3.h\n  f4.h\n  ... and 1 more files\n\n... and 2 more files not shown"
        );
    }

    #[test]
    fn root_files_render_under_dot() {
        let tree = render_directory_tree(Path::new("/p"), &[PathBuf::from("/p/main.cpp")], 50, 5);
        assert_eq!(tree, ".\n  main.cpp");
    }
}
