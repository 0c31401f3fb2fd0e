use crate::filters::PathFilter;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scanner for finding source files under a project root
pub struct FileScanner<'a> {
    root: PathBuf,
    filter: &'a PathFilter,
    max_file_bytes: u64,
}

impl<'a> FileScanner<'a> {
    pub fn new(root: impl AsRef<Path>, filter: &'a PathFilter, max_file_bytes: u64) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            filter,
            max_file_bytes,
        }
    }

    /// Walk the root and return matching files, deduplicated and sorted
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = BTreeSet::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !Self::is_hidden_dir(entry.path(), &self.root));

        for result in walker {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }

                    let path = entry.path();
                    let Ok(relative) = path.strip_prefix(&self.root) else {
                        continue;
                    };
                    let rel = relative.to_string_lossy();
                    if !self.filter.allows(&rel) {
                        continue;
                    }

                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > self.max_file_bytes {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                self.max_file_bytes
                            );
                            continue;
                        }
                    }

                    files.insert(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        log::info!("Found {} source files", files.len());
        files.into_iter().collect()
    }

    fn is_hidden_dir(path: &Path, root: &Path) -> bool {
        if path == root {
            return false;
        }
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.') && path.is_dir())
    }
}
