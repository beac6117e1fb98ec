//! Curation change sets.

use super::{Catalog, ClipMetadata, VocalizationType};
use crate::constants::quality;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Edits to apply to existing clips, keyed by clip identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeSet {
    /// Per-clip edits.
    #[serde(default)]
    pub modified: BTreeMap<String, ClipChanges>,
}

/// Fields a reviewer may change. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClipChanges {
    /// New canonical flag.
    pub canonical: Option<bool>,
    /// New rejected flag.
    pub rejected: Option<bool>,
    /// New quality score.
    pub quality_score: Option<u8>,
    /// New vocalization type.
    pub vocalization_type: Option<VocalizationType>,
}

/// What a change set did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewStats {
    /// Canonical flags flipped.
    pub canonical_changes: usize,
    /// Clips newly rejected.
    pub rejections: usize,
    /// Quality scores changed.
    pub quality_changes: usize,
    /// Vocalization types changed.
    pub vocalization_changes: usize,
    /// Identifiers in the change set that are not in the catalog.
    pub unknown_ids: Vec<String>,
}

impl ChangeSet {
    /// Read a change set from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::CatalogRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::CatalogParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply every edit to `catalog`.
    ///
    /// Quality scores are checked before anything changes. Canonical
    /// uniqueness is checked by the save that follows.
    pub fn apply(&self, catalog: &mut Catalog) -> Result<ReviewStats> {
        if let Some(value) = self
            .modified
            .values()
            .filter_map(|c| c.quality_score)
            .find(|q| !(quality::MIN..=quality::MAX).contains(q))
        {
            return Err(Error::InvalidQualityScore { value });
        }

        let mut stats = ReviewStats::default();
        for (clip_id, changes) in &self.modified {
            let Some(clip) = catalog.get_mut(clip_id) else {
                warn!("Change set names unknown clip {clip_id}, skipping");
                stats.unknown_ids.push(clip_id.clone());
                continue;
            };
            changes.apply_to(clip, &mut stats);
        }
        Ok(stats)
    }
}

impl ClipChanges {
    fn apply_to(&self, clip: &mut ClipMetadata, stats: &mut ReviewStats) {
        if let Some(canonical) = self.canonical
            && canonical != clip.canonical
        {
            clip.canonical = canonical;
            stats.canonical_changes += 1;
        }
        if let Some(rejected) = self.rejected
            && rejected != clip.rejected
        {
            clip.rejected = rejected;
            if rejected {
                stats.rejections += 1;
            }
        }
        if let Some(score) = self.quality_score
            && score != clip.quality_score
        {
            clip.quality_score = score;
            stats.quality_changes += 1;
        }
        if let Some(kind) = self.vocalization_type
            && kind != clip.vocalization_type
        {
            clip.vocalization_type = kind;
            stats.vocalization_changes += 1;
        }
    }
}
