use anyhow::{Context, Result};
use autodoc_cache::CacheStore;
use autodoc_generation::{existing_artifacts, Pipeline, RunSummary};
use autodoc_llm::ProviderKind;
use autodoc_structure::StructureExtractor;
use clap::{Args, Parser, Subcommand};
use config::{AutodocConfig, Overrides};
use std::path::PathBuf;
use std::time::Duration;

mod config;
mod report;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "autodoc")]
#[command(about = "Incremental LLM-written documentation for C++ projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (defaults to ./autodoc.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documentation for changed parts of the project
    Run(RunArgs),

    /// Print the extracted project structure as JSON
    Scan(ScanArgs),

    /// Inspect or reset the fingerprint and content caches
    Cache(CacheArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Source root (overrides `source_root` from the config)
    source: Option<PathBuf>,

    /// Output directory for markdown artifacts
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Regenerate every unit regardless of fingerprints
    #[arg(long)]
    force: bool,

    /// Disable change detection and the content cache for this run
    #[arg(long)]
    no_cache: bool,

    /// Worker pool size for per-file generation
    #[arg(long)]
    concurrency: Option<usize>,

    /// Text generation provider: anthropic|openai|ollama|lmstudio
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Model id (defaults to the provider's model)
    #[arg(long)]
    model: Option<String>,

    /// Run as a background job and report progress while it works
    #[arg(long)]
    background: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            source_root: self.source.clone(),
            output_dir: self.output.clone(),
            force: self.force,
            no_cache: self.no_cache,
            concurrency: self.concurrency,
            provider: self.provider,
            model: self.model.clone(),
        }
    }
}

#[derive(Args)]
struct ScanArgs {
    /// Source root (overrides `source_root` from the config)
    source: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct CacheArgs {
    #[command(subcommand)]
    action: CacheAction,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show tracked files and cached items
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Delete all fingerprints and cached content
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Run(args) => args.json,
        Commands::Scan(_) => true,
        Commands::Cache(args) => matches!(args.action, CacheAction::Stats { json: true }),
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper internals are noisy at debug
    if !cli.verbose {
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AutodocConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => run_docs(args, config).await?,
        Commands::Scan(args) => run_scan(args, config).await?,
        Commands::Cache(args) => run_cache(args, config)?,
    }

    Ok(())
}

/// Generate documentation
async fn run_docs(args: RunArgs, mut config: AutodocConfig) -> Result<()> {
    config.apply(args.overrides());

    if !config.generation.enabled {
        log::info!("Documentation generation is disabled, nothing to do");
        if args.json {
            println!("{}", serde_json::json!({ "status": "disabled" }));
        }
        return Ok(());
    }

    // Credentials and patterns are validated before any work starts
    let pipeline = Pipeline::from_settings(
        config.generation.clone(),
        config.extractor.clone(),
        CacheStore::new(&config.cache.dir, config.cache.enabled),
        &config.llm,
    )
    .context("Invalid configuration")?;

    log::info!(
        "Using {} with up to {} parallel calls",
        pipeline.generator_id(),
        config.generation.worker_count()
    );

    let existing = existing_artifacts(&config.output_dir);
    if !existing.is_empty() {
        log::info!(
            "{} existing artifacts available under {}",
            existing.len(),
            config.output_dir.display()
        );
    }

    let summary = if args.background {
        run_in_background(&pipeline, &config).await?
    } else {
        pipeline
            .run(&config.source_root, &config.output_dir)
            .await
            .context("Documentation run failed")?
    };

    report::print_summary(&summary, args.json)
}

async fn run_in_background(pipeline: &Pipeline, config: &AutodocConfig) -> Result<RunSummary> {
    let handle = pipeline.spawn_background(&config.source_root, &config.output_dir)?;
    log::info!("Background generation started");

    let mut reported = 0;
    while handle.is_running() {
        tokio::time::sleep(PROGRESS_INTERVAL).await;
        let written = handle.snapshot().len();
        if written != reported {
            log::info!("Progress: {written} artifacts written");
            reported = written;
        }
    }

    handle.wait().await.context("Background documentation run failed")
}

/// Print the project structure
async fn run_scan(args: ScanArgs, mut config: AutodocConfig) -> Result<()> {
    if let Some(source) = args.source {
        config.source_root = source;
    }
    let extractor = StructureExtractor::new(config.extractor.clone())
        .context("Invalid extractor configuration")?;
    let root = config.source_root.clone();
    let project = tokio::task::spawn_blocking(move || extractor.scan(&root))
        .await?
        .with_context(|| format!("Cannot scan {}", config.source_root.display()))?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&project)?
    } else {
        serde_json::to_string(&project)?
    };
    println!("{output}");
    Ok(())
}

fn run_cache(args: CacheArgs, config: AutodocConfig) -> Result<()> {
    let cache = CacheStore::new(&config.cache.dir, config.cache.enabled);
    match args.action {
        CacheAction::Stats { json } => report::print_cache_stats(&cache.stats(), json),
        CacheAction::Clear => {
            cache
                .clear()
                .with_context(|| format!("Failed to clear {}", config.cache.dir.display()))?;
            eprintln!("Cache cleared: {}", config.cache.dir.display());
            Ok(())
        }
    }
}
