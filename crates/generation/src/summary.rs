use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome counts for one tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierSummary {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// What a pipeline run did
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub project: TierSummary,
    pub modules: TierSummary,
    pub units: TierSummary,

    /// Files in the changed set this run
    pub changed_files: usize,

    /// Artifacts written this run, in completion order
    pub artifacts: Vec<PathBuf>,

    /// Calls made to the text generator, retries included
    pub external_calls: usize,

    pub cache_hits: usize,

    pub links_added: usize,

    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.project.failed + self.modules.failed + self.units.failed
    }

    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Documentation run finished in {:.1}s", self.elapsed.as_secs_f64())?;
        write_row(f, "project", &self.project)?;
        write_row(f, "modules", &self.modules)?;
        write_row(f, "units", &self.units)?;
        writeln!(
            f,
            "  {} changed files, {} artifacts, {} generator calls, {} cache hits, {} links",
            self.changed_files,
            self.artifacts.len(),
            self.external_calls,
            self.cache_hits,
            self.links_added
        )
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, label: &str, tier: &TierSummary) -> fmt::Result {
    writeln!(
        f,
        "  {label:<8} generated {:>4}  skipped {:>4}  failed {:>4}",
        tier.generated, tier.skipped, tier.failed
    )
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}
