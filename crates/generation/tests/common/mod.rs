#![allow(dead_code)]

use async_trait::async_trait;
use autodoc_cache::CacheStore;
use autodoc_generation::{GenerationConfig, Pipeline};
use autodoc_llm::{LlmError, TextGenerator};
use autodoc_structure::{ExtractorConfig, StructureExtractor};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Deterministic generator that records every prompt it sees
#[derive(Default)]
pub struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
    fail_marker: Option<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fails every prompt containing `marker`
    pub fn failing_on(marker: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_marker: Some(marker.to_string()),
            ..Default::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn calls_containing(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|prompt| prompt.contains(needle))
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn id(&self) -> &str {
        "test:scripted"
    }

    async fn generate(&self, prompt: &str, _max_output_tokens: u32) -> autodoc_llm::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_marker {
            if prompt.contains(marker.as_str()) {
                return Err(LlmError::Http {
                    status: 503,
                    message: "overloaded".to_string(),
                });
            }
        }
        Ok(respond(prompt))
    }
}

fn respond(prompt: &str) -> String {
    let name = prompt
        .lines()
        .find_map(|line| line.strip_prefix("**Name**: "))
        .unwrap_or_default();

    if prompt.starts_with("Analyze this C++ class") {
        format!("# {name}\n\n{name} cooperates with Baz and Foo.\n")
    } else if prompt.starts_with("Analyze this C++ module") {
        format!("# {name} module\n\nThe module groups Foo and Baz.\n")
    } else if prompt.starts_with("Document the free functions") {
        "# Functions\n\nHelpers used by Foo.\n".to_string()
    } else {
        "# Overview\n\nStart with the a module.\n".to_string()
    }
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// `a/Foo.h` uses `a/Baz.h`
pub fn sample_project(root: &Path) {
    write(
        root,
        "a/Foo.h",
        "#include \"a/Baz.h\"\n\nclass Foo {\npublic:\n    void bar();\nprivate:\n    Baz* baz_;\n};\n",
    );
    write(root, "a/Baz.h", "class Baz {\npublic:\n    int size() const;\n};\n");
}

pub fn pipeline(
    cache_dir: &Path,
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
) -> Pipeline {
    pipeline_with_cache(CacheStore::new(cache_dir, true), generator, config)
}

pub fn pipeline_with_cache(
    cache: CacheStore,
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
) -> Pipeline {
    let extractor = Arc::new(StructureExtractor::new(ExtractorConfig::default()).unwrap());
    Pipeline::new(config, extractor, Arc::new(cache), generator)
}

/// Relative path → content for every artifact under `root`
pub fn read_tree(root: &Path) -> Vec<(String, String)> {
    autodoc_generation::existing_artifacts(root)
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).unwrap();
            (relative(root, &path), content)
        })
        .collect()
}

pub fn relative(root: &Path, path: &PathBuf) -> String {
    path.strip_prefix(root)
        .unwrap()
        .to_string_lossy()
        .replace('\\', "/")
}
