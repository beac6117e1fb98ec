//! Clip identifier schemes.

use crate::constants::ids::{CONTENT_HASH_HEX_LEN, GENERIC_TAG};
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// How new clip identifiers are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScheme {
    /// `{CODE}_{hash}` over source file and start offset. Re-ingesting the
    /// same recording reproduces the same identifiers.
    ContentHash,
    /// `{CODE}_{SOURCEID}_{n}` or `{CODE}_clip_{n}`, numbered after the
    /// highest existing clip with that prefix.
    Sequential,
}

/// Inputs an identifier is derived from.
#[derive(Debug, Clone, Copy)]
pub struct IdKey<'a> {
    /// Species code, already validated.
    pub species_code: &'a str,
    /// Source recording id, e.g. `XC12345`.
    pub source_id: Option<&'a str>,
    /// Name of the source recording file.
    pub source_file: &'a str,
    /// First sample of the clip in the prepared source.
    pub start_sample: usize,
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Content-hash identifier.
pub fn content_hash_id(species_code: &str, source_file: &str, start_sample: usize) -> String {
    let digest = Sha256::digest(format!("{source_file}:{start_sample}").as_bytes());
    let hex: String = digest
        .iter()
        .flat_map(|byte| {
            [
                HEX_DIGITS[usize::from(byte >> 4)],
                HEX_DIGITS[usize::from(byte & 0x0f)],
            ]
        })
        .take(CONTENT_HASH_HEX_LEN)
        .map(char::from)
        .collect();
    format!("{}_{hex}", species_code.to_uppercase())
}

/// Prefix shared by sequential identifiers of one source.
pub fn sequential_prefix(species_code: &str, source_id: Option<&str>) -> String {
    let tag = source_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(GENERIC_TAG);
    format!("{}_{tag}_", species_code.to_uppercase())
}

/// Hands out identifiers that are unique against the catalog and against
/// each other.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    taken: HashSet<String>,
}

impl IdAllocator {
    /// Seed the allocator with identifiers already in use.
    pub fn new<I, S>(existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: existing.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether an identifier is in use.
    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Allocate one identifier.
    ///
    /// A content-hash collision with an existing clip is a duplicate and
    /// fails; sequential identifiers always advance past the highest `n`.
    pub fn allocate(&mut self, scheme: IdScheme, key: &IdKey<'_>) -> Result<String> {
        let id = match scheme {
            IdScheme::ContentHash => {
                content_hash_id(key.species_code, key.source_file, key.start_sample)
            }
            IdScheme::Sequential => self.next_sequential(key.species_code, key.source_id),
        };
        if !self.taken.insert(id.clone()) {
            return Err(Error::DuplicateClipId { id });
        }
        Ok(id)
    }

    /// Release identifiers whose clips were never written.
    pub fn release<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for id in ids {
            self.taken.remove(id);
        }
    }

    fn next_sequential(&self, species_code: &str, source_id: Option<&str>) -> String {
        let prefix = sequential_prefix(species_code, source_id);
        let highest = self
            .taken
            .iter()
            .filter_map(|id| id.strip_prefix(&prefix))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{prefix}{}", highest + 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key<'a>(source_id: Option<&'a str>, start: usize) -> IdKey<'a> {
        IdKey {
            species_code: "noca",
            source_id,
            source_file: "XC12345.mp3",
            start_sample: start,
        }
    }

    #[test]
    fn content_hash_is_stable() {
        let a = content_hash_id("NOCA", "XC12345.mp3", 44_100);
        let b = content_hash_id("NOCA", "XC12345.mp3", 44_100);
        let c = content_hash_id("NOCA", "XC12345.mp3", 44_101);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("NOCA_"));
        assert_eq!(a.len(), "NOCA_".len() + CONTENT_HASH_HEX_LEN);
        assert!(a[5..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn content_hash_matches_sha256_prefix() {
        // sha256("a.wav:0") starts with these 12 hex characters.
        let digest = Sha256::digest(b"a.wav:0");
        let expected: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
        assert_eq!(content_hash_id("AMRO", "a.wav", 0), format!("AMRO_{expected}"));
    }

    #[test]
    fn sequential_ids_follow_highest_existing() {
        let mut ids = IdAllocator::new(["NOCA_XC12345_1", "NOCA_XC12345_4", "NOCA_clip_2"]);
        assert_eq!(
            ids.allocate(IdScheme::Sequential, &key(Some("XC12345"), 0))
                .unwrap(),
            "NOCA_XC12345_5"
        );
        assert_eq!(
            ids.allocate(IdScheme::Sequential, &key(Some("XC12345"), 0))
                .unwrap(),
            "NOCA_XC12345_6"
        );
        assert_eq!(
            ids.allocate(IdScheme::Sequential, &key(None, 0)).unwrap(),
            "NOCA_clip_3"
        );
        assert_eq!(
            ids.allocate(IdScheme::Sequential, &key(Some("XC999"), 0))
                .unwrap(),
            "NOCA_XC999_1"
        );
    }

    #[test]
    fn duplicate_content_hash_is_rejected() {
        let existing = content_hash_id("NOCA", "XC12345.mp3", 10);
        let mut ids = IdAllocator::new([existing.clone()]);
        let err = ids
            .allocate(IdScheme::ContentHash, &key(None, 10))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateClipId { id } if id == existing));
    }

    #[test]
    fn released_ids_can_be_reused() {
        let mut ids = IdAllocator::default();
        let id = ids.allocate(IdScheme::ContentHash, &key(None, 0)).unwrap();
        ids.release([&id]);
        assert!(!ids.is_taken(&id));
        assert_eq!(ids.allocate(IdScheme::ContentHash, &key(None, 0)).unwrap(), id);
    }
}
