use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Project overview artifact, relative to the output root
pub const GETTING_STARTED_FILE: &str = "00-getting-started.md";

/// Architecture overview artifact, relative to the output root
pub const ARCHITECTURE_FILE: &str = "01-architecture.md";

const MODULES_DIR: &str = "modules";
const CLASSES_DIR: &str = "api/classes";
const FUNCTIONS_DIR: &str = "api/functions";

/// Kind of documented entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Module,
    Class,
    Function,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
        }
    }
}

/// Where each artifact lives under the output root
///
/// ```text
/// <root>/
///   00-getting-started.md
///   01-architecture.md
///   modules/<module>.md
///   api/classes/<class>.md
///   api/functions/<file-stem>.md
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn getting_started(&self) -> PathBuf {
        self.root.join(GETTING_STARTED_FILE)
    }

    pub fn architecture(&self) -> PathBuf {
        self.root.join(ARCHITECTURE_FILE)
    }

    pub fn module_file(&self, module: &str) -> PathBuf {
        self.entity_file(EntityKind::Module, module)
    }

    pub fn class_file(&self, class: &str) -> PathBuf {
        self.entity_file(EntityKind::Class, class)
    }

    /// Free-function artifact for one source file, named after its stem
    pub fn functions_file(&self, file_stem: &str) -> PathBuf {
        self.entity_file(EntityKind::Function, file_stem)
    }

    pub fn entity_file(&self, kind: EntityKind, name: &str) -> PathBuf {
        let dir = match kind {
            EntityKind::Module => MODULES_DIR,
            EntityKind::Class => CLASSES_DIR,
            EntityKind::Function => FUNCTIONS_DIR,
        };
        self.root
            .join(dir)
            .join(format!("{}.md", sanitize_filename(name)))
    }
}

/// Lower-case, map `::`, spaces and underscores to `-`, drop anything else that is not alphanumeric
pub fn sanitize_filename(name: &str) -> String {
    let lowered = name.to_lowercase().replace("::", "-");
    let safe: String = lowered
        .chars()
        .filter_map(|ch| match ch {
            ' ' | '_' => Some('-'),
            c if c.is_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect();
    if safe.is_empty() {
        "unnamed".to_string()
    } else {
        safe
    }
}

/// Replace `path` via a sibling temp file so concurrent readers never see a partial artifact
pub fn write_artifact(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("md.tmp");
    fs::write(&tmp, text)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

/// Link from `from_file` to `target`: relative to the file's directory when
/// possible, else root-relative with a leading `/`, else `#`
pub fn relative_link(from_file: &Path, target: &Path, root: &Path) -> String {
    if let Some(rel) = from_file.parent().and_then(|dir| diff_paths(target, dir)) {
        return to_slash(&rel);
    }
    match target.strip_prefix(root) {
        Ok(rel) => format!("/{}", to_slash(rel)),
        Err(_) => "#".to_string(),
    }
}

fn diff_paths(target: &Path, base: &Path) -> Option<PathBuf> {
    if target.is_absolute() != base.is_absolute() {
        return None;
    }

    let mut target_parts = target.components().peekable();
    let mut base_parts = base.components().peekable();

    // Different drive prefixes cannot be related
    if let (Some(Component::Prefix(a)), Some(Component::Prefix(b))) =
        (target_parts.peek(), base_parts.peek())
    {
        if a != b {
            return None;
        }
    }

    while let (Some(t), Some(b)) = (target_parts.peek(), base_parts.peek()) {
        if t != b {
            break;
        }
        target_parts.next();
        base_parts.next();
    }

    let mut out = PathBuf::new();
    for part in base_parts {
        match part {
            Component::Normal(_) => out.push(".."),
            Component::CurDir => {}
            _ => return None,
        }
    }
    for part in target_parts {
        match part {
            Component::Normal(name) => out.push(name),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn artifact_writes_replace_without_leftovers() {
        let temp = tempfile::tempdir().unwrap();
        let path = OutputLayout::new(temp.path()).class_file("Foo");

        write_artifact(&path, "# Foo\n").unwrap();
        write_artifact(&path, "# Foo\n\nv2\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# Foo\n\nv2\n");
        assert!(!path.with_extension("md.tmp").exists());
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_filename("Foo"), "foo");
        assert_eq!(sanitize_filename("net::Http_Client v2"), "net-http-client-v2");
        assert_eq!(sanitize_filename("operator<<"), "operator");
        assert_eq!(sanitize_filename("<>"), "unnamed");
    }

    #[test]
    fn layout_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.class_file("Foo"), PathBuf::from("/out/api/classes/foo.md"));
        assert_eq!(layout.module_file("core_io"), PathBuf::from("/out/modules/core-io.md"));
        assert_eq!(
            layout.functions_file("string_utils"),
            PathBuf::from("/out/api/functions/string-utils.md")
        );
        assert_eq!(layout.getting_started(), PathBuf::from("/out/00-getting-started.md"));
    }

    #[test]
    fn links_are_relative_to_the_referencing_file() {
        let root = Path::new("/out");
        let target = Path::new("/out/api/classes/baz.md");
        assert_eq!(relative_link(Path::new("/out/api/classes/foo.md"), target, root), "baz.md");
        assert_eq!(
            relative_link(Path::new("/out/modules/a.md"), target, root),
            "../api/classes/baz.md"
        );
        assert_eq!(
            relative_link(Path::new("/out/00-getting-started.md"), target, root),
            "api/classes/baz.md"
        );
    }

    #[test]
    fn unrelated_paths_fall_back() {
        let root = Path::new("/out");
        assert_eq!(
            relative_link(Path::new("notes/x.md"), Path::new("/out/api/classes/baz.md"), root),
            "/api/classes/baz.md"
        );
        assert_eq!(
            relative_link(Path::new("notes/x.md"), Path::new("/elsewhere/baz.md"), root),
            "#"
        );
    }
}
