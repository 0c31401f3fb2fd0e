use crate::index::CrossReferenceIndex;
use crate::layout::{relative_link, write_artifact, EntityKind, OutputLayout};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Links inserted per entity per artifact
pub const MAX_LINKS_PER_ENTITY: usize = 3;

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[[^\]\n]*\]\([^)\n]*\)").expect("link regex"));

static INLINE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]*`").expect("code regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub links_added: usize,
}

/// One linkable entity with its compiled mention pattern
struct Linker {
    name: String,
    kind: EntityKind,
    pattern: Regex,
    target: PathBuf,
}

impl Linker {
    fn new(kind: EntityKind, name: &str, layout: &OutputLayout) -> Option<Self> {
        let escaped = regex::escape(name);
        let source = match kind {
            EntityKind::Module => format!(r"\b{escaped}\s+module\b"),
            EntityKind::Class | EntityKind::Function => format!(r"\b{escaped}\b"),
        };
        match Regex::new(&source) {
            Ok(pattern) => Some(Self {
                name: name.to_string(),
                kind,
                pattern,
                target: layout.entity_file(kind, name),
            }),
            Err(err) => {
                log::warn!("Skipping cross-references for {name}: {err}");
                None
            }
        }
    }

    fn label(&self) -> String {
        match self.kind {
            EntityKind::Module => format!("{} module", self.name),
            EntityKind::Class | EntityKind::Function => self.name.clone(),
        }
    }
}

#[derive(Debug)]
struct Protected {
    range: Range<usize>,
    is_link: bool,
}

impl CrossReferenceIndex {
    /// Rewrite artifacts in place, linking mentions of registered classes and modules.
    ///
    /// Per entity at most [`MAX_LINKS_PER_ENTITY`] mentions are linked, counting
    /// mentions already inside links, so re-running over resolved files is a no-op.
    pub fn resolve_all(&self, output_root: &Path, artifacts: &[PathBuf]) -> ResolveStats {
        let layout = OutputLayout::new(output_root);
        let mut linkers: Vec<Linker> = Vec::new();
        for kind in [EntityKind::Class, EntityKind::Module] {
            linkers.extend(
                self.names(kind)
                    .iter()
                    .filter_map(|name| Linker::new(kind, name, &layout)),
            );
        }

        log::info!(
            "Updating cross-references in {} files ({} linkable entities)",
            artifacts.len(),
            linkers.len()
        );

        let mut stats = ResolveStats::default();
        let mut seen = HashSet::new();
        for artifact in artifacts {
            if !seen.insert(artifact) {
                continue;
            }
            let content = match fs::read_to_string(artifact) {
                Ok(content) => content,
                Err(err) => {
                    log::warn!("Cannot read {} for cross-referencing: {err}", artifact.display());
                    continue;
                }
            };
            stats.files_scanned += 1;

            let (rewritten, added) = linkify(&content, artifact, output_root, &linkers);
            if rewritten == content {
                continue;
            }
            match write_artifact(artifact, &rewritten) {
                Ok(()) => {
                    stats.files_rewritten += 1;
                    stats.links_added += added;
                    log::debug!("Updated references in: {}", artifact.display());
                }
                Err(err) => log::warn!("Cannot update references in {}: {err}", artifact.display()),
            }
        }

        log::info!(
            "Cross-references: {} links added across {} files",
            stats.links_added,
            stats.files_rewritten
        );
        stats
    }
}

fn linkify(content: &str, from_file: &Path, root: &Path, linkers: &[Linker]) -> (String, usize) {
    let mut text = content.to_string();
    let mut added = 0;

    for linker in linkers {
        if linker.target == from_file {
            continue;
        }

        let protected = protected_ranges(&text);
        let mut already_linked = 0;
        let mut picks: Vec<Range<usize>> = Vec::new();
        for mention in linker.pattern.find_iter(&text) {
            if let Some(span) = protected.iter().find(|p| p.range.contains(&mention.start())) {
                if span.is_link {
                    already_linked += 1;
                }
                continue;
            }
            if text[mention.end()..].starts_with(']') || text[..mention.start()].ends_with('[') {
                continue;
            }
            picks.push(mention.range());
        }
        picks.truncate(MAX_LINKS_PER_ENTITY.saturating_sub(already_linked));
        if picks.is_empty() {
            continue;
        }

        let link = format!(
            "[{}]({})",
            linker.label(),
            relative_link(from_file, &linker.target, root)
        );
        for range in picks.iter().rev() {
            text.replace_range(range.clone(), &link);
        }
        added += picks.len();
    }

    (text, added)
}

/// Byte ranges that must not be rewritten: links, inline code and fenced code blocks
fn protected_ranges(text: &str) -> Vec<Protected> {
    let mut ranges = fenced_blocks(text);
    let in_fence = |pos: usize, ranges: &[Protected]| ranges.iter().any(|p| p.range.contains(&pos));

    let mut extra = Vec::new();
    for code in INLINE_CODE_RE.find_iter(text) {
        if !in_fence(code.start(), &ranges) {
            extra.push(Protected {
                range: code.range(),
                is_link: false,
            });
        }
    }
    for link in LINK_RE.find_iter(text) {
        if !in_fence(link.start(), &ranges) {
            extra.push(Protected {
                range: link.range(),
                is_link: true,
            });
        }
    }
    ranges.extend(extra);
    ranges
}

fn fenced_blocks(text: &str) -> Vec<Protected> {
    let mut blocks = Vec::new();
    let mut open: Option<usize> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            match open.take() {
                Some(start) => blocks.push(Protected {
                    range: start..offset + line.len(),
                    is_link: false,
                }),
                None => open = Some(offset),
            }
        }
        offset += line.len();
    }
    if let Some(start) = open {
        blocks.push(Protected {
            range: start..text.len(),
            is_link: false,
        });
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn class_linkers(names: &[&str]) -> Vec<Linker> {
        let layout = OutputLayout::new("/out");
        names
            .iter()
            .filter_map(|name| Linker::new(EntityKind::Class, name, &layout))
            .collect()
    }

    #[test]
    fn links_at_most_three_mentions() {
        let linkers = class_linkers(&["Baz"]);
        let from = Path::new("/out/api/classes/foo.md");
        let (text, added) = linkify("Baz Baz Baz Baz Baz", from, Path::new("/out"), &linkers);
        assert_eq!(added, 3);
        assert_eq!(text, "[Baz](baz.md) [Baz](baz.md) [Baz](baz.md) Baz Baz");
    }

    #[test]
    fn skips_code_and_existing_links() {
        let linkers = class_linkers(&["Baz"]);
        let from = Path::new("/out/api/classes/foo.md");
        let body = "Use `Baz` or [Baz](x.md).\n```cpp\nBaz b;\n```\nThen Baz.\n";
        let (text, added) = linkify(body, from, Path::new("/out"), &linkers);
        assert_eq!(added, 1);
        assert_eq!(
            text,
            "Use `Baz` or [Baz](x.md).\n```cpp\nBaz b;\n```\nThen [Baz](baz.md).\n"
        );
    }

    #[test]
    fn second_pass_adds_nothing() {
        let linkers = class_linkers(&["Baz"]);
        let from = Path::new("/out/modules/a.md");
        let (once, _) = linkify("Baz, Baz, Baz, Baz.", from, Path::new("/out"), &linkers);
        let (twice, added) = linkify(&once, from, Path::new("/out"), &linkers);
        assert_eq!(added, 0);
        assert_eq!(once, twice);
        assert!(once.contains("[Baz](../api/classes/baz.md)"));
    }

    #[test]
    fn no_self_links_and_whole_words_only() {
        let linkers = class_linkers(&["Foo"]);
        let (text, added) = linkify(
            "Foo and FooBar",
            Path::new("/out/api/classes/foo.md"),
            Path::new("/out"),
            &linkers,
        );
        assert_eq!(added, 0);
        assert_eq!(text, "Foo and FooBar");
    }

    #[test]
    fn module_phrase_is_linked() {
        let layout = OutputLayout::new("/out");
        let linkers: Vec<Linker> = Linker::new(EntityKind::Module, "net", &layout).into_iter().collect();
        let (text, added) = linkify(
            "See the net module and the network.",
            Path::new("/out/01-architecture.md"),
            Path::new("/out"),
            &linkers,
        );
        assert_eq!(added, 1);
        assert_eq!(text, "See the [net module](modules/net.md) and the network.");
    }
}
