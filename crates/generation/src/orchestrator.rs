use crate::config::GenerationConfig;
use crate::error::Result;
use crate::prompts;
use crate::summary::{RunSummary, TierSummary};
use autodoc_cache::{fingerprint_parts, CacheStore};
use autodoc_llm::{LlmError, TextGenerator};
use autodoc_structure::{FileInfo, ProjectStructure, StructureExtractor};
use autodoc_xref::{CrossReferenceIndex, EntityKind, OutputLayout};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Documentation level, processed strictly in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Project,
    Module,
    Unit,
}

impl Tier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Module => "module",
            Self::Unit => "unit",
        }
    }
}

/// Append-only list of written artifacts, shared with observers of a running job
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    inner: Arc<Mutex<Vec<PathBuf>>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: PathBuf) {
        self.lock().push(path);
    }

    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn since(&self, start: usize) -> Vec<PathBuf> {
        self.lock().get(start..).map(<[PathBuf]>::to_vec).unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Default)]
struct Counters {
    external_calls: AtomicUsize,
    cache_hits: AtomicUsize,
}

/// Per-file bookkeeping for the fingerprint update.
///
/// A changed file is recorded only when some tier actually processed it and no
/// tier failed on it.
#[derive(Debug, Default)]
struct FileOutcomes {
    processed: HashSet<PathBuf>,
    failed: HashSet<PathBuf>,
}

impl FileOutcomes {
    fn successful(&self, changed: Vec<PathBuf>) -> Vec<PathBuf> {
        changed
            .into_iter()
            .filter(|path| self.processed.contains(path) && !self.failed.contains(path))
            .collect()
    }
}

enum UnitOutcome {
    Generated,
    /// Parsed fine but holds no classes or functions
    Empty,
    Failed,
}

/// Drives the three tiers over one `ProjectStructure`.
///
/// Every collaborator is injected. Cloning is cheap and clones share the
/// cache, index, counters and result list.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    config: GenerationConfig,
    extractor: Arc<StructureExtractor>,
    cache: Arc<CacheStore>,
    generator: Arc<dyn TextGenerator>,
    xref: Arc<CrossReferenceIndex>,
    results: ResultSink,
    counters: Arc<Counters>,
}

impl GenerationOrchestrator {
    pub fn new(
        config: GenerationConfig,
        extractor: Arc<StructureExtractor>,
        cache: Arc<CacheStore>,
        generator: Arc<dyn TextGenerator>,
        xref: Arc<CrossReferenceIndex>,
    ) -> Self {
        Self {
            config,
            extractor,
            cache,
            generator,
            xref,
            results: ResultSink::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Publish artifacts into an externally observed list
    pub fn with_results(mut self, results: ResultSink) -> Self {
        self.results = results;
        self
    }

    pub fn results(&self) -> &ResultSink {
        &self.results
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// `<tier>:<identity>:<sha256(generator id, prompt)>`
    pub fn generation_key(&self, tier: Tier, identity: &str, prompt: &str) -> String {
        format!(
            "{}:{identity}:{}",
            tier.as_str(),
            fingerprint_parts([self.generator.id(), prompt])
        )
    }

    /// Run tiers 1 → 2 → 3, then cross-referencing, then record fingerprints
    /// for every changed file that a module or unit tier processed without failure.
    pub async fn run(&self, project: Arc<ProjectStructure>, output_root: &Path) -> Result<RunSummary> {
        let started = Instant::now();
        let first_artifact = self.results.len();
        let calls_before = self.counters.external_calls.load(Ordering::Relaxed);
        let hits_before = self.counters.cache_hits.load(Ordering::Relaxed);

        tokio::fs::create_dir_all(output_root).await?;
        let layout = OutputLayout::new(output_root);

        let changed: Vec<PathBuf> = if self.config.force {
            log::info!("Force regenerate enabled - processing all files");
            project.files.clone()
        } else {
            let cache = Arc::clone(&self.cache);
            let files = project.files.clone();
            tokio::task::spawn_blocking(move || cache.detect_changed(&files)).await?
        };
        let changed_set: HashSet<PathBuf> = changed.iter().cloned().collect();
        let mut outcomes = FileOutcomes::default();

        let mut summary = RunSummary {
            changed_files: changed.len(),
            ..Default::default()
        };

        if self.config.project_level {
            log::info!("Generating project-level documentation...");
            summary.project = self.project_tier(&project, &layout).await;
        }

        if self.config.module_level {
            log::info!("Generating module documentation...");
            summary.modules = self
                .module_tier(&project, &layout, &changed_set, &mut outcomes)
                .await;
        }

        if self.config.unit_level {
            log::info!("Generating detailed API documentation...");
            summary.units = self
                .unit_tier(&project, &layout, &changed, &changed_set, &mut outcomes)
                .await;
        }

        summary.artifacts = self.results.since(first_artifact);

        if self.config.cross_references {
            let xref = Arc::clone(&self.xref);
            let root = output_root.to_path_buf();
            let artifacts = summary.artifacts.clone();
            let stats = tokio::task::spawn_blocking(move || xref.resolve_all(&root, &artifacts)).await?;
            summary.links_added = stats.links_added;
        }

        let successful = outcomes.successful(changed);
        if !successful.is_empty() {
            log::info!(
                "Updating cache for {} successfully processed files",
                successful.len()
            );
            let cache = Arc::clone(&self.cache);
            match tokio::task::spawn_blocking(move || cache.update(&successful)).await? {
                Ok(()) => {}
                Err(err) => log::warn!("Failed to persist fingerprints: {err}"),
            }
        }
        if !outcomes.failed.is_empty() {
            log::warn!(
                "{} files will be retried on the next run",
                outcomes.failed.len()
            );
        }

        summary.external_calls = self.counters.external_calls.load(Ordering::Relaxed) - calls_before;
        summary.cache_hits = self.counters.cache_hits.load(Ordering::Relaxed) - hits_before;
        summary.elapsed = started.elapsed();
        log::info!(
            "Generated {} documentation files ({} failed units)",
            summary.artifacts.len(),
            summary.failed()
        );
        Ok(summary)
    }

    async fn project_tier(&self, project: &ProjectStructure, layout: &OutputLayout) -> TierSummary {
        let mut tier = TierSummary::default();
        let jobs = [
            (
                "getting-started",
                prompts::getting_started(project),
                layout.getting_started(),
            ),
            (
                "architecture",
                prompts::architecture(project),
                layout.architecture(),
            ),
        ];

        for (identity, prompt, artifact) in jobs {
            match self.produce(Tier::Project, identity, &prompt, &artifact).await {
                Ok(_) => tier.generated += 1,
                Err(err) => {
                    log::error!("Failed to generate {identity} documentation: {err}");
                    tier.failed += 1;
                }
            }
        }
        tier
    }

    async fn module_tier(
        &self,
        project: &ProjectStructure,
        layout: &OutputLayout,
        changed: &HashSet<PathBuf>,
        outcomes: &mut FileOutcomes,
    ) -> TierSummary {
        let mut tier = TierSummary::default();

        for module in &project.modules {
            let artifact = layout.module_file(&module.name);
            if !self.config.force && !module.touches(changed) {
                tier.skipped += 1;
                self.register_existing(EntityKind::Module, &module.name, &artifact)
                    .await;
                continue;
            }

            let extractor = Arc::clone(&self.extractor);
            let owned = module.clone();
            let hydrated =
                match tokio::task::spawn_blocking(move || extractor.hydrate_module(&owned)).await {
                    Ok(hydrated) => hydrated,
                    Err(err) => {
                        log::error!("Failed to analyze module {}: {err}", module.name);
                        tier.failed += 1;
                        outcomes.failed.extend(module.files.iter().cloned());
                        continue;
                    }
                };

            let prompt = prompts::module(&hydrated, project);
            match self
                .produce(Tier::Module, &module.name, &prompt, &artifact)
                .await
            {
                Ok(text) => {
                    self.xref.register(EntityKind::Module, &module.name, &text);
                    tier.generated += 1;
                    outcomes.processed.extend(
                        module
                            .files
                            .iter()
                            .filter(|file| changed.contains(*file))
                            .cloned(),
                    );
                }
                Err(err) => {
                    log::error!(
                        "Failed to generate module documentation for {}: {err}",
                        module.name
                    );
                    tier.failed += 1;
                    outcomes.failed.extend(module.files.iter().cloned());
                }
            }
        }

        if tier.skipped > 0 {
            log::info!("Skipped {} unchanged modules", tier.skipped);
        }
        tier
    }

    async fn unit_tier(
        &self,
        project: &Arc<ProjectStructure>,
        layout: &OutputLayout,
        changed: &[PathBuf],
        changed_set: &HashSet<PathBuf>,
        outcomes: &mut FileOutcomes,
    ) -> TierSummary {
        let mut tier = TierSummary::default();

        let unchanged: Vec<PathBuf> = project
            .files
            .iter()
            .filter(|file| !changed_set.contains(*file))
            .cloned()
            .collect();
        tier.skipped += unchanged.len();
        self.register_unchanged_units(project, layout, unchanged).await;

        let workers = self.config.worker_count();
        log::info!(
            "Processing {} files with {workers} parallel workers",
            changed.len()
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        for file in changed {
            let this = self.clone();
            let project = Arc::clone(project);
            let layout = layout.clone();
            let semaphore = Arc::clone(&semaphore);
            let file = file.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (file, UnitOutcome::Failed);
                };
                let outcome = this.process_file(&project, &layout, &file).await;
                (file, outcome)
            });
        }

        // Anything left here never reported success
        let mut pending: HashSet<PathBuf> = changed.iter().cloned().collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((file, UnitOutcome::Generated)) => {
                    tier.generated += 1;
                    pending.remove(&file);
                    outcomes.processed.insert(file);
                }
                Ok((file, UnitOutcome::Empty)) => {
                    tier.skipped += 1;
                    pending.remove(&file);
                    outcomes.processed.insert(file);
                }
                Ok((file, UnitOutcome::Failed)) => {
                    log::error!("Failed to generate documentation for {}", file.display());
                    tier.failed += 1;
                }
                Err(err) => {
                    log::error!("Documentation worker crashed: {err}");
                    tier.failed += 1;
                }
            }
        }
        outcomes.failed.extend(pending);
        tier
    }

    async fn process_file(
        &self,
        project: &ProjectStructure,
        layout: &OutputLayout,
        file: &Path,
    ) -> UnitOutcome {
        let Some(info) = self.parse(file).await else {
            return UnitOutcome::Failed;
        };
        if !info.has_entities() {
            log::debug!("Nothing to document in {}", file.display());
            return UnitOutcome::Empty;
        }

        let module = project.module_of(file).map(|module| module.name.clone());
        let mut failures = 0usize;

        for class in &info.classes {
            let prompt = prompts::class(class, &info, project);
            let artifact = layout.class_file(&class.name);
            match self.produce(Tier::Unit, &class.name, &prompt, &artifact).await {
                Ok(text) => self
                    .xref
                    .register_class(&class.name, &text, module.as_deref(), Some(file)),
                Err(err) => {
                    log::error!(
                        "Failed to document class {} from {}: {err}",
                        class.name,
                        file.display()
                    );
                    failures += 1;
                }
            }
        }

        if !info.functions.is_empty() {
            let stem = file_stem(file);
            let prompt = prompts::functions(&info.functions, &info, project);
            let artifact = layout.functions_file(&stem);
            match self.produce(Tier::Unit, &stem, &prompt, &artifact).await {
                Ok(text) => self.xref.register(EntityKind::Function, &stem, &text),
                Err(err) => {
                    log::error!(
                        "Failed to document functions in {}: {err}",
                        file.display()
                    );
                    failures += 1;
                }
            }
        }

        if failures == 0 {
            UnitOutcome::Generated
        } else {
            UnitOutcome::Failed
        }
    }

    /// Register entities of files that were not regenerated, using artifacts already on disk
    async fn register_unchanged_units(
        &self,
        project: &Arc<ProjectStructure>,
        layout: &OutputLayout,
        files: Vec<PathBuf>,
    ) {
        if !self.config.cross_references || files.is_empty() {
            return;
        }

        let extractor = Arc::clone(&self.extractor);
        let parsed: Vec<FileInfo> = tokio::task::spawn_blocking(move || {
            files
                .iter()
                .filter_map(|file| extractor.parse_file(file))
                .collect()
        })
        .await
        .unwrap_or_default();

        for info in parsed {
            let module = project.module_of(&info.path).map(|module| module.name.as_str());
            for class in &info.classes {
                if let Some(text) = read_artifact(&layout.class_file(&class.name)).await {
                    self.xref
                        .register_class(&class.name, &text, module, Some(&info.path));
                }
            }
            if !info.functions.is_empty() {
                let stem = file_stem(&info.path);
                self.register_existing(EntityKind::Function, &stem, &layout.functions_file(&stem))
                    .await;
            }
        }
    }

    async fn register_existing(&self, kind: EntityKind, name: &str, artifact: &Path) {
        if !self.config.cross_references {
            return;
        }
        if let Some(text) = read_artifact(artifact).await {
            self.xref.register(kind, name, &text);
        }
    }

    async fn parse(&self, file: &Path) -> Option<FileInfo> {
        let extractor = Arc::clone(&self.extractor);
        let path = file.to_path_buf();
        match tokio::task::spawn_blocking(move || extractor.parse_file(&path)).await {
            Ok(info) => info,
            Err(err) => {
                log::error!("Parser crashed on {}: {err}", file.display());
                None
            }
        }
    }

    /// Cached-or-generated text written to `artifact` and published
    async fn produce(&self, tier: Tier, identity: &str, prompt: &str, artifact: &Path) -> Result<String> {
        let text = self.generate_cached(tier, identity, prompt).await?;
        write_artifact(artifact, &text).await?;
        self.results.push(artifact.to_path_buf());
        log::info!("Generated: {}", artifact.display());
        Ok(text)
    }

    async fn generate_cached(&self, tier: Tier, identity: &str, prompt: &str) -> Result<String> {
        let key = self.generation_key(tier, identity, prompt);
        if let Some(text) = self.cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            log::info!("Using cached {} documentation for {identity}", tier.as_str());
            return Ok(text);
        }

        let text = self.generate_with_retry(identity, prompt).await?;
        let cache = Arc::clone(&self.cache);
        let stored = text.clone();
        match tokio::task::spawn_blocking(move || cache.set(&key, &stored)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log::warn!("Failed to cache documentation for {identity}: {err}"),
            Err(err) => log::warn!("Cache writer for {identity} crashed: {err}"),
        }
        Ok(text)
    }

    /// One call, plus exactly one retry when enabled
    async fn generate_with_retry(&self, identity: &str, prompt: &str) -> Result<String> {
        let attempts = self.config.attempts();
        let timeout = self.config.call_timeout();
        let mut last_error = LlmError::InvalidResponse("no attempt made".to_string());

        for attempt in 1..=attempts {
            self.counters.external_calls.fetch_add(1, Ordering::Relaxed);
            let call = self.generator.generate(prompt, self.config.max_tokens);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(err)) => last_error = err,
                Err(_) => last_error = LlmError::Timeout(timeout),
            }
            if attempt < attempts {
                log::warn!(
                    "Generation for {identity} failed ({last_error}, transient: {}), retrying once",
                    last_error.is_transient()
                );
            }
        }

        Err(last_error.into())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "functions".to_string())
}

async fn read_artifact(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path).await.ok()
}

/// Write via a temp file so readers never observe a partial artifact
async fn write_artifact(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("md.tmp");
    tokio::fs::write(&tmp, text).await?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}
