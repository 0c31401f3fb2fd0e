//! # Autodoc Generation
//!
//! Tiered documentation generation over a scanned C++ project.
//!
//! ```text
//! source root ──scan──> ProjectStructure
//!                          │
//!     changed set = detect_changed(files)   (all files with force)
//!                          │
//!   tier 1  project    getting-started + architecture
//!   tier 2  module     one artifact per module touching the changed set
//!   tier 3  unit       classes + free functions, bounded worker pool
//!                          │
//!   cross-references   rewrite this run's artifacts with relative links
//!                          │
//!   fingerprints       recorded only for files whose units all succeeded
//! ```
//!
//! Every generation call goes through the content cache first and is retried
//! exactly once on failure. A failed unit never stops the run; its file keeps
//! the old fingerprint and is picked up again next time.

mod config;
mod error;
mod handle;
mod orchestrator;
mod pipeline;
pub mod prompts;
mod summary;

pub use config::GenerationConfig;
pub use error::{GenerationError, Result};
pub use handle::GenerationHandle;
pub use orchestrator::{GenerationOrchestrator, ResultSink, Tier};
pub use pipeline::{existing_artifacts, Pipeline};
pub use summary::{RunSummary, TierSummary};
