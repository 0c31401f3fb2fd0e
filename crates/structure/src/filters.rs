use crate::error::{Result, StructureError};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled include/exclude rules, matched against root-relative `/`-separated paths
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
    exclude_substrings: Vec<String>,
}

impl PathFilter {
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self> {
        let include = build_set(include_patterns.iter().map(String::as_str))?;

        let mut exclude_globs = Vec::new();
        let mut exclude_substrings = Vec::new();
        for raw in exclude_patterns {
            let pattern = raw.trim();
            if pattern.is_empty() {
                continue;
            }
            if has_glob_meta(pattern) {
                exclude_globs.push(pattern);
            } else {
                exclude_substrings.push(pattern.replace('\\', "/"));
            }
        }
        let exclude = build_set(exclude_globs.into_iter())?;

        Ok(Self {
            include,
            exclude,
            exclude_substrings,
        })
    }

    /// Whether a root-relative path is selected
    pub fn allows(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.replace('\\', "/");
        self.include.is_match(&rel_path) && !self.excludes(&rel_path)
    }

    fn excludes(&self, rel_path: &str) -> bool {
        if self.exclude.is_match(rel_path) {
            return true;
        }
        // Substring rules see a leading slash so `/build/` matches a top-level `build` dir
        let anchored = format!("/{rel_path}");
        self.exclude_substrings
            .iter()
            .any(|needle| anchored.contains(needle.as_str()))
    }
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

fn build_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|err| StructureError::invalid_pattern(pattern, err.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| StructureError::invalid_pattern("<set>", err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> PathFilter {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        PathFilter::new(&include, &exclude).unwrap()
    }

    #[test]
    fn include_globs_match_root_and_nested_files() {
        let f = filter(&["**/*.h"], &[]);
        assert!(f.allows("Foo.h"));
        assert!(f.allows("a/b/Foo.h"));
        assert!(!f.allows("a/Foo.cpp"));
    }

    #[test]
    fn exclude_supports_glob_and_substring() {
        let f = filter(&["**/*.h"], &["**/build/**", "generated"]);
        assert!(!f.allows("build/Foo.h"));
        assert!(!f.allows("x/build/y/Foo.h"));
        assert!(!f.allows("src/generated_api.h"));
        assert!(f.allows("src/builder.h"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let include = vec!["a/{b".to_string()];
        let err = PathFilter::new(&include, &[]).unwrap_err();
        assert!(matches!(err, StructureError::InvalidPattern { .. }));
    }
}
