mod common;

use autodoc_generation::GenerationConfig;
use common::{pipeline, sample_project, ScriptedGenerator};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn background_run_exposes_partial_results() {
    let temp = tempdir().unwrap();
    let (src, docs, cache) = (temp.path().join("src"), temp.path().join("docs"), temp.path().join("cache"));
    sample_project(&src);

    let generator = ScriptedGenerator::slow(Duration::from_millis(20));
    let handle = pipeline(&cache, generator.clone(), GenerationConfig::default())
        .spawn_background(&src, &docs)
        .unwrap();
    assert!(handle.is_running());

    let mut seen = 0;
    while handle.is_running() {
        let snapshot = handle.snapshot();
        assert!(snapshot.len() >= seen, "artifact list only grows");
        seen = snapshot.len();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let snapshot = handle.snapshot();
    let summary = handle.wait().await.unwrap();
    assert_eq!(summary.artifacts, snapshot);
    assert_eq!(snapshot.len(), 5);
    assert!(snapshot.iter().all(|path| path.exists()));
}
