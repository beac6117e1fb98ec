//! In-memory catalog and its invariants.

use super::ClipMetadata;
use crate::constants::quality;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Ordered collection of clip records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    clips: Vec<ClipMetadata>,
}

impl Catalog {
    /// Wrap loaded records without validating them.
    pub fn new(clips: Vec<ClipMetadata>) -> Self {
        Self { clips }
    }

    /// All records in file order.
    pub fn clips(&self) -> &[ClipMetadata] {
        &self.clips
    }

    /// Consume the catalog, returning its records.
    pub fn into_clips(self) -> Vec<ClipMetadata> {
        self.clips
    }

    /// Number of records, rejected ones included.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the catalog has no records.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Look up a record by identifier.
    pub fn get(&self, clip_id: &str) -> Option<&ClipMetadata> {
        self.clips.iter().find(|c| c.clip_id == clip_id)
    }

    /// Mutable lookup by identifier.
    pub fn get_mut(&mut self, clip_id: &str) -> Option<&mut ClipMetadata> {
        self.clips.iter_mut().find(|c| c.clip_id == clip_id)
    }

    /// Identifiers of all records.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|c| c.clip_id.as_str())
    }

    /// Whether any record came from this source recording.
    pub fn has_source(&self, source: &str, source_id: &str) -> bool {
        self.clips
            .iter()
            .any(|c| c.source == source && c.source_id.as_deref() == Some(source_id))
    }

    /// Common name already recorded for a species, if any.
    pub fn common_name_for(&self, species_code: &str) -> Option<&str> {
        self.clips
            .iter()
            .find(|c| c.species_code == species_code && !c.common_name.is_empty())
            .map(|c| c.common_name.as_str())
    }

    /// Active canonical clip of a species.
    pub fn canonical_for(&self, species_code: &str) -> Option<&ClipMetadata> {
        self.clips
            .iter()
            .find(|c| c.species_code == species_code && c.canonical && !c.rejected)
    }

    /// Distinct species codes in first-seen order.
    pub fn species(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.clips
            .iter()
            .map(|c| c.species_code.as_str())
            .filter(|code| seen.insert(*code))
            .collect()
    }

    /// Append one record, refusing duplicate identifiers.
    pub fn push(&mut self, clip: ClipMetadata) -> Result<()> {
        if self.get(&clip.clip_id).is_some() {
            return Err(Error::DuplicateClipId { id: clip.clip_id });
        }
        self.clips.push(clip);
        Ok(())
    }

    /// Append a batch of candidate records.
    ///
    /// Either every candidate is appended or the catalog is left as it was.
    /// Returns the number of records added.
    pub fn merge(&mut self, candidates: Vec<ClipMetadata>) -> Result<usize> {
        let mut seen: HashSet<&str> = self.ids().collect();
        for candidate in &candidates {
            if !seen.insert(candidate.clip_id.as_str()) {
                return Err(Error::DuplicateClipId {
                    id: candidate.clip_id.clone(),
                });
            }
        }

        let before = self.clips.len();
        let added = candidates.len();
        let mut merged = self.clips.clone();
        merged.extend(candidates);
        ensure_not_shrunk(before, merged.len())?;

        self.clips = merged;
        Ok(added)
    }

    /// Remove rejected records, returning them.
    pub fn prune_rejected(&mut self) -> Vec<ClipMetadata> {
        let (rejected, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.clips).into_iter().partition(|c| c.rejected);
        self.clips = kept;
        rejected
    }

    /// Check catalog-wide invariants.
    ///
    /// Identifiers must be unique, quality scores in range, and each species
    /// may have at most one active canonical clip.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut canonicals: HashMap<&str, &str> = HashMap::new();

        for clip in &self.clips {
            if !ids.insert(clip.clip_id.as_str()) {
                return Err(Error::DuplicateClipId {
                    id: clip.clip_id.clone(),
                });
            }
            if !(quality::MIN..=quality::MAX).contains(&clip.quality_score) {
                return Err(Error::InvalidQualityScore {
                    value: clip.quality_score,
                });
            }
            if clip.canonical
                && !clip.rejected
                && let Some(first) = canonicals.insert(&clip.species_code, &clip.clip_id)
            {
                return Err(Error::MultipleCanonicals {
                    species: clip.species_code.clone(),
                    first: first.to_string(),
                    second: clip.clip_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Per-species counts of active clips.
    pub fn species_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for clip in self.clips.iter().filter(|c| c.is_active()) {
            *counts.entry(clip.species_code.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Fail if a save would leave fewer records than before.
pub fn ensure_not_shrunk(before: usize, after: usize) -> Result<()> {
    if after < before {
        return Err(Error::CatalogShrunk { before, after });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::VocalizationType;

    pub(crate) fn clip(id: &str, species: &str) -> ClipMetadata {
        ClipMetadata {
            clip_id: id.to_string(),
            species_code: species.to_string(),
            common_name: format!("{species} common name"),
            vocalization_type: VocalizationType::Song,
            duration_ms: 2000,
            quality_score: 5,
            loudness_lufs: Some(-16.0),
            source: "xenocanto".to_string(),
            source_id: Some(format!("XC{}", id.len())),
            source_url: None,
            recordist: None,
            file_path: format!("data/clips/{id}.wav"),
            spectrogram_path: None,
            canonical: false,
            rejected: false,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn merge_appends_all_candidates() {
        let mut catalog = Catalog::new(vec![clip("A_1", "AMRO")]);
        let added = catalog
            .merge(vec![clip("B_1", "BLJA"), clip("B_2", "BLJA")])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.clips()[0].clip_id, "A_1");
    }

    #[test]
    fn merge_with_duplicate_leaves_catalog_untouched() {
        let original = Catalog::new(vec![clip("A_1", "AMRO")]);
        let mut catalog = original.clone();
        let err = catalog
            .merge(vec![clip("B_1", "BLJA"), clip("A_1", "AMRO")])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateClipId { id } if id == "A_1"));
        assert_eq!(catalog, original);
    }

    #[test]
    fn merge_rejects_duplicates_within_candidates() {
        let mut catalog = Catalog::default();
        assert!(catalog.merge(vec![clip("X", "AMRO"), clip("X", "AMRO")]).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn shrinking_is_refused() {
        assert!(ensure_not_shrunk(3, 3).is_ok());
        assert!(ensure_not_shrunk(3, 4).is_ok());
        let err = ensure_not_shrunk(5, 4).unwrap_err();
        assert!(matches!(err, Error::CatalogShrunk { before: 5, after: 4 }));
    }

    #[test]
    fn two_active_canonicals_are_invalid() {
        let mut a = clip("NOCA_1", "NOCA");
        a.canonical = true;
        let mut b = clip("NOCA_2", "NOCA");
        b.canonical = true;
        let catalog = Catalog::new(vec![a, b.clone()]);
        let err = catalog.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "multiple canonical clips for species NOCA: NOCA_1 and NOCA_2"
        );

        // A rejected canonical does not count.
        let mut a = clip("NOCA_1", "NOCA");
        a.canonical = true;
        b.rejected = true;
        assert!(Catalog::new(vec![a, b]).validate().is_ok());
    }

    #[test]
    fn out_of_range_quality_is_invalid() {
        let mut bad = clip("A_1", "AMRO");
        bad.quality_score = 0;
        assert!(matches!(
            Catalog::new(vec![bad]).validate().unwrap_err(),
            Error::InvalidQualityScore { value: 0 }
        ));
    }

    #[test]
    fn prune_removes_only_rejected() {
        let mut rejected = clip("A_2", "AMRO");
        rejected.rejected = true;
        let mut catalog = Catalog::new(vec![clip("A_1", "AMRO"), rejected, clip("A_3", "AMRO")]);
        let pruned = catalog.prune_rejected();
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].clip_id, "A_2");
        let ids: Vec<&str> = catalog.ids().collect();
        assert_eq!(ids, vec!["A_1", "A_3"]);
    }

    #[test]
    fn species_in_first_seen_order() {
        let catalog = Catalog::new(vec![
            clip("B_1", "BLJA"),
            clip("A_1", "AMRO"),
            clip("B_2", "BLJA"),
        ]);
        assert_eq!(catalog.species(), vec!["BLJA", "AMRO"]);
        assert_eq!(catalog.species_counts()["BLJA"], 2);
    }
}
