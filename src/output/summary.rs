//! Batch outcome accounting.

use crate::error::{Error, Result};
use tracing::info;

/// Per-item tally of a batch command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Items that produced at least one clip.
    pub succeeded: usize,
    /// Items skipped (already ingested, filtered out).
    pub skipped: usize,
    /// Items that failed.
    pub failed: usize,
    /// Clips produced across all items.
    pub clips: usize,
}

impl BatchSummary {
    /// Record an item that produced `clips` clips.
    pub fn record_success(&mut self, clips: usize) {
        self.succeeded += 1;
        self.clips += clips;
    }

    /// Record a skipped item.
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Record a failed item.
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Total items seen.
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// Log the final tally.
    pub fn log(&self, label: &str) {
        info!(
            "{label}: {} succeeded, {} skipped, {} failed ({} clips)",
            self.succeeded, self.skipped, self.failed, self.clips
        );
    }

    /// Fail the batch when nothing succeeded.
    ///
    /// Partial success is still success.
    pub fn into_result(self) -> Result<Self> {
        if self.succeeded == 0 {
            return Err(Error::NoClipsProduced {
                skipped: self.skipped,
                failed: self.failed,
            });
        }
        Ok(self)
    }
}
