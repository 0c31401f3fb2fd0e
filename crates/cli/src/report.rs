use anyhow::Result;
use autodoc_cache::CacheStats;
use autodoc_generation::RunSummary;

pub fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    eprint!("{summary}");
    if !summary.is_complete() {
        eprintln!(
            "{} units failed and will be retried on the next run",
            summary.failed()
        );
    }
    Ok(())
}

pub fn print_cache_stats(stats: &CacheStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("Cache directory: {}", stats.cache_dir.display());
    println!("Enabled:         {}", if stats.enabled { "yes" } else { "no" });
    println!("Tracked files:   {}", stats.tracked_files);
    println!("Cached items:    {}", stats.cached_items);
    Ok(())
}
