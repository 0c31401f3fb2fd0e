//! # Autodoc Cross-References
//!
//! Registry of documented entities plus the post-generation pass that turns
//! plain-text mentions into relative markdown links.
//!
//! ```text
//! tiers 2/3 ──register──> CrossReferenceIndex ──resolve_all──> artifacts rewritten in place
//!                          ├─ modules   name → text
//!                          ├─ classes   name → text (+ module membership)
//!                          └─ functions name → text
//! ```
//!
//! A mention is never linked inside an existing link, inline code or a fenced
//! block, and each entity gets at most three links per file.

mod index;
mod layout;
mod resolver;

pub use index::CrossReferenceIndex;
pub use layout::{
    relative_link, sanitize_filename, write_artifact, EntityKind, OutputLayout, ARCHITECTURE_FILE,
    GETTING_STARTED_FILE,
};
pub use resolver::{ResolveStats, MAX_LINKS_PER_ENTITY};
