//! Clip catalog: record types, invariants, persistence and curation.

mod audit;
mod clips;
pub mod command;
mod review;
mod store;
mod types;

pub use audit::{AuditReport, audit};
pub use clips::{Catalog, ensure_not_shrunk};
pub use review::{ChangeSet, ClipChanges, ReviewStats};
pub use store::{CatalogStore, MergeReport, load_clip_file};
pub use types::{ClipMetadata, VocalizationType, quality_from_letter, round_lufs};
