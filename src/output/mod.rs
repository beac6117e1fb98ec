//! Output helpers: staged file writes, progress bars and batch summaries.

pub mod progress;
mod staged;
mod summary;

pub use staged::{StagedFile, write_atomic};
pub use summary::BatchSummary;
