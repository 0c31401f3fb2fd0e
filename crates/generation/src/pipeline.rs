use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::handle::GenerationHandle;
use crate::orchestrator::{GenerationOrchestrator, ResultSink};
use crate::summary::RunSummary;
use autodoc_cache::CacheStore;
use autodoc_llm::{LlmConfig, TextGenerator};
use autodoc_structure::{ExtractorConfig, StructureExtractor};
use autodoc_xref::CrossReferenceIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Scan → generate → cross-reference, wired from injected collaborators
#[derive(Clone)]
pub struct Pipeline {
    config: GenerationConfig,
    extractor: Arc<StructureExtractor>,
    cache: Arc<CacheStore>,
    generator: Arc<dyn TextGenerator>,
}

impl Pipeline {
    pub fn new(
        config: GenerationConfig,
        extractor: Arc<StructureExtractor>,
        cache: Arc<CacheStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            extractor,
            cache,
            generator,
        }
    }

    /// Build every collaborator from settings.
    ///
    /// Bad include/exclude patterns and missing credentials surface as
    /// `GenerationError::Configuration` before any work starts.
    pub fn from_settings(
        config: GenerationConfig,
        extractor: ExtractorConfig,
        cache: CacheStore,
        llm: &LlmConfig,
    ) -> Result<Self> {
        let extractor = StructureExtractor::new(extractor)?;
        let generator = autodoc_llm::build_generator(llm)?;
        Ok(Self::new(config, Arc::new(extractor), Arc::new(cache), generator))
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn generator_id(&self) -> &str {
        self.generator.id()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Run to completion
    pub async fn run(&self, source_root: impl AsRef<Path>, output_root: impl AsRef<Path>) -> Result<RunSummary> {
        self.run_into(
            source_root.as_ref().to_path_buf(),
            output_root.as_ref().to_path_buf(),
            ResultSink::new(),
        )
        .await
    }

    /// Start a run on the runtime and return immediately.
    ///
    /// The enabled gate is checked up front so a disabled pipeline never
    /// spawns anything.
    pub fn spawn_background(
        &self,
        source_root: impl AsRef<Path>,
        output_root: impl AsRef<Path>,
    ) -> Result<GenerationHandle> {
        if !self.config.enabled {
            return Err(GenerationError::Disabled);
        }

        let results = ResultSink::new();
        let pipeline = self.clone();
        let source_root = source_root.as_ref().to_path_buf();
        let output_root = output_root.as_ref().to_path_buf();
        let sink = results.clone();
        Ok(GenerationHandle::spawn(results, async move {
            pipeline.run_into(source_root, output_root, sink).await
        }))
    }

    async fn run_into(&self, source_root: PathBuf, output_root: PathBuf, results: ResultSink) -> Result<RunSummary> {
        if !self.config.enabled {
            return Err(GenerationError::Disabled);
        }

        let extractor = Arc::clone(&self.extractor);
        let project = tokio::task::spawn_blocking(move || extractor.scan(&source_root)).await??;

        // Fresh index per run; entities from earlier runs are re-registered from disk
        let orchestrator = GenerationOrchestrator::new(
            self.config.clone(),
            Arc::clone(&self.extractor),
            Arc::clone(&self.cache),
            Arc::clone(&self.generator),
            Arc::new(CrossReferenceIndex::new()),
        )
        .with_results(results);

        orchestrator.run(Arc::new(project), &output_root).await
    }
}

/// Every markdown artifact under `output_root`, sorted
pub fn existing_artifacts(output_root: impl AsRef<Path>) -> Vec<PathBuf> {
    let mut artifacts: Vec<PathBuf> = WalkDir::new(output_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    artifacts.sort();
    artifacts
}
