//! # Autodoc Cache
//!
//! Change detection and generated-content reuse for incremental runs.
//!
//! Two independent tables live under one cache directory:
//!
//! ```text
//! <cache_dir>/
//!   file_hashes.json     absolute path   → SHA-256 of file bytes
//!   content_cache.json   generation key  → previously generated text
//! ```
//!
//! Fingerprints are only updated for paths whose work succeeded, so a failed
//! unit keeps its old fingerprint and is retried on the next run.

mod error;
mod fingerprint;
mod store;

pub use error::{CacheError, Result};
pub use fingerprint::{fingerprint_bytes, fingerprint_file, fingerprint_parts};
pub use store::{CacheStats, CacheStore, CONTENT_FILE, FINGERPRINTS_FILE};
