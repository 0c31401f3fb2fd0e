mod common;

use autodoc_cache::CacheStore;
use autodoc_generation::{GenerationConfig, GenerationError, Pipeline};
use autodoc_llm::{LlmConfig, ProviderKind};
use autodoc_structure::ExtractorConfig;
use common::{pipeline, pipeline_with_cache, read_tree, relative, sample_project, write, ScriptedGenerator};
use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn first_run_documents_every_tier_with_links() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    let generator = ScriptedGenerator::new();
    let summary = pipeline(&cache, generator.clone(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();

    assert_eq!(generator.calls(), 5);
    assert_eq!(summary.external_calls, 5);
    assert_eq!(summary.changed_files, 2);
    assert_eq!(summary.units.generated, 2);
    assert!(summary.is_complete());

    let tree = read_tree(&docs);
    let names: Vec<&str> = tree.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "00-getting-started.md",
            "01-architecture.md",
            "api/classes/baz.md",
            "api/classes/foo.md",
            "modules/a.md",
        ]
    );

    let content = |name: &str| tree.iter().find(|(n, _)| n == name).unwrap().1.clone();
    assert_eq!(
        content("api/classes/foo.md"),
        "# Foo\n\nFoo cooperates with [Baz](baz.md) and Foo.\n"
    );
    assert_eq!(
        content("modules/a.md"),
        "# a module\n\nThe module groups [Foo](../api/classes/foo.md) and [Baz](../api/classes/baz.md).\n"
    );
    assert_eq!(
        content("01-architecture.md"),
        "# Overview\n\nStart with the [a module](modules/a.md).\n"
    );
}

#[tokio::test]
async fn unchanged_rerun_makes_no_calls_and_keeps_output() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    pipeline(&cache, ScriptedGenerator::new(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();
    let before = read_tree(&docs);

    let generator = ScriptedGenerator::new();
    let summary = pipeline(&cache, generator.clone(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();

    assert_eq!(generator.calls(), 0);
    assert_eq!(summary.changed_files, 0);
    assert_eq!(summary.cache_hits, 2);
    assert_eq!(summary.modules.skipped, 1);
    assert_eq!(summary.units.skipped, 2);
    assert_eq!(read_tree(&docs), before);
}

#[tokio::test]
async fn edited_file_regenerates_only_its_units() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    pipeline(&cache, ScriptedGenerator::new(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();

    write(
        &src,
        "a/Baz.h",
        "class Baz {\npublic:\n    int size() const;\n    void clear();\n};\n",
    );

    let generator = ScriptedGenerator::new();
    let summary = pipeline(&cache, generator.clone(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();

    assert_eq!(summary.changed_files, 1);
    assert_eq!(generator.calls_containing("**Name**: Baz"), 1);
    assert_eq!(generator.calls_containing("**Name**: Foo"), 0);
    assert_eq!(summary.units.generated, 1);
    assert_eq!(summary.units.skipped, 1);

    // Foo was not regenerated but still resolves as a link target
    let baz = fs::read_to_string(docs.join("api/classes/baz.md")).unwrap();
    assert_eq!(baz, "# Baz\n\nBaz cooperates with Baz and [Foo](foo.md).\n");
}

#[tokio::test]
async fn failed_unit_is_retried_once_and_stays_pending() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    let generator = ScriptedGenerator::failing_on("**Name**: Baz");
    let summary = pipeline(&cache, generator.clone(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();

    assert_eq!(generator.calls_containing("**Name**: Baz"), 2);
    assert_eq!(summary.units.failed, 1);
    assert_eq!(summary.units.generated, 1);
    assert!(!summary.is_complete());

    let names: Vec<String> = summary.artifacts.iter().map(|p| relative(&docs, p)).collect();
    assert!(names.contains(&"api/classes/foo.md".to_string()));
    assert!(!names.contains(&"api/classes/baz.md".to_string()));
    assert!(!docs.join("api/classes/baz.md").exists());

    let store = CacheStore::new(&cache, true);
    let root = src.canonicalize().unwrap();
    assert!(store.has_changed(&root.join("a/Baz.h")));
    assert!(!store.has_changed(&root.join("a/Foo.h")));

    // The next healthy run picks up only the failed file
    let generator = ScriptedGenerator::new();
    let summary = pipeline(&cache, generator.clone(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();
    assert_eq!(summary.changed_files, 1);
    assert_eq!(generator.calls_containing("**Name**: Baz"), 1);
    assert_eq!(generator.calls_containing("**Name**: Foo"), 0);
    assert!(docs.join("api/classes/baz.md").exists());
}

#[tokio::test]
async fn project_only_run_leaves_files_pending_for_lower_tiers() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    let config = GenerationConfig {
        module_level: false,
        unit_level: false,
        ..Default::default()
    };
    let summary = pipeline(&cache, ScriptedGenerator::new(), config)
        .run(&src, &docs)
        .await
        .unwrap();
    assert_eq!(summary.changed_files, 2);
    assert!(!docs.join("api/classes/foo.md").exists());

    let store = CacheStore::new(&cache, true);
    let root = src.canonicalize().unwrap();
    assert!(store.has_changed(&root.join("a/Foo.h")));
    assert!(store.has_changed(&root.join("a/Baz.h")));

    let generator = ScriptedGenerator::new();
    let summary = pipeline(&cache, generator.clone(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();
    assert_eq!(summary.changed_files, 2);
    assert_eq!(summary.units.generated, 2);
    assert_eq!(generator.calls_containing("**Name**: Foo"), 1);
    assert!(docs.join("api/classes/foo.md").exists());
    assert!(docs.join("modules/a.md").exists());
}

#[tokio::test]
async fn disabled_cache_regenerates_everything_each_run() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    let mut trees = Vec::new();
    for _ in 0..2 {
        let generator = ScriptedGenerator::new();
        let summary = pipeline_with_cache(CacheStore::new(&cache, false), generator.clone(), GenerationConfig::default())
            .run(&src, &docs)
            .await
            .unwrap();

        assert_eq!(generator.calls(), 5);
        assert_eq!(summary.changed_files, 2);
        assert_eq!(summary.cache_hits, 0);
        assert_eq!(summary.units.generated, 2);
        assert_eq!(summary.units.skipped, 0);
        trees.push(read_tree(&docs));
    }

    assert_eq!(trees[0], trees[1]);
    assert!(!cache.exists());
}

#[tokio::test]
async fn no_retry_when_disabled() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    let config = GenerationConfig {
        retry_failed: false,
        ..Default::default()
    };
    let generator = ScriptedGenerator::failing_on("**Name**: Baz");
    pipeline(&cache, generator.clone(), config)
        .run(&src, &docs)
        .await
        .unwrap();

    assert_eq!(generator.calls_containing("**Name**: Baz"), 1);
}

#[tokio::test]
async fn force_reuses_cached_content() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    pipeline(&cache, ScriptedGenerator::new(), GenerationConfig::default())
        .run(&src, &docs)
        .await
        .unwrap();

    let config = GenerationConfig {
        force: true,
        ..Default::default()
    };
    let generator = ScriptedGenerator::new();
    let summary = pipeline(&cache, generator.clone(), config)
        .run(&src, &docs)
        .await
        .unwrap();

    assert_eq!(summary.changed_files, 2);
    assert_eq!(summary.modules.generated, 1);
    assert_eq!(summary.units.generated, 2);
    assert_eq!(summary.cache_hits, 5);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn worker_pool_bounds_concurrent_calls() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    for i in 0..6 {
        write(&src, &format!("core/Type{i}.h"), &format!("class Type{i} {{}};\n"));
    }

    let config = GenerationConfig {
        project_level: false,
        module_level: false,
        concurrency: 2,
        ..Default::default()
    };
    let generator = ScriptedGenerator::slow(Duration::from_millis(30));
    let summary = pipeline(&cache, generator.clone(), config)
        .run(&src, &docs)
        .await
        .unwrap();

    assert_eq!(summary.units.generated, 6);
    assert_eq!(generator.calls(), 6);
    assert!(generator.max_in_flight() <= 2);
    assert!(summary.artifacts.iter().all(|p| p.starts_with(docs.join("api/classes"))));
}

#[tokio::test]
async fn disabled_pipeline_does_nothing() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    let config = GenerationConfig {
        enabled: false,
        ..Default::default()
    };
    let generator = ScriptedGenerator::new();
    let pipeline = pipeline(&cache, generator.clone(), config);

    assert!(matches!(pipeline.run(&src, &docs).await, Err(GenerationError::Disabled)));
    assert!(matches!(pipeline.spawn_background(&src, &docs), Err(GenerationError::Disabled)));
    assert_eq!(generator.calls(), 0);
    assert!(!docs.exists());
}

#[tokio::test]
async fn missing_source_root_is_fatal() {
    let temp = tempdir().unwrap();
    let pipeline = pipeline(&temp.path().join("cache"), ScriptedGenerator::new(), GenerationConfig::default());

    let err = pipeline
        .run(temp.path().join("missing"), temp.path().join("docs"))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::SourceRoot(_)));
    assert!(err.is_fatal());
}

#[test]
fn malformed_pattern_is_a_configuration_error() {
    let temp = tempdir().unwrap();
    let extractor = ExtractorConfig {
        exclude_patterns: vec!["[".to_string()],
        ..Default::default()
    };
    let llm = LlmConfig {
        provider: ProviderKind::Ollama,
        ..Default::default()
    };

    let err = Pipeline::from_settings(
        GenerationConfig::default(),
        extractor,
        CacheStore::new(temp.path().join("cache"), true),
        &llm,
    )
    .err()
    .unwrap();
    assert!(matches!(err, GenerationError::Configuration(_)));
    assert!(err.is_fatal());
}
