//! Catalog command execution: merge, review and validate.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::{AuditReport, CatalogStore, ChangeSet, MergeReport, ReviewStats, audit, load_clip_file};
use crate::config::ProjectLayout;
use crate::error::{Error, Result};

/// Longest list of offending clips printed per audit category.
const MAX_LISTED: usize = 10;

/// Execute the merge command.
pub fn merge(candidates: &Path, layout: &ProjectLayout) -> Result<MergeReport> {
    let clips = load_clip_file(candidates)?;
    let store = CatalogStore::new(layout.catalog_path());
    let _lock = store.lock()?;

    let report = store.merge(clips)?;
    info!(
        "Merged {} clips ({} -> {})",
        report.added, report.before, report.after
    );
    Ok(report)
}

/// Outcome of a review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Edits applied.
    pub stats: ReviewStats,
    /// Rejected clips removed from the catalog.
    pub removed: usize,
    /// Audio and spectrogram files deleted.
    pub files_deleted: usize,
}

/// Execute the review command.
///
/// Rejected clips are removed from the catalog, and their files deleted
/// once the catalog has been saved.
pub fn review(changes: &Path, layout: &ProjectLayout) -> Result<ReviewOutcome> {
    let changes = ChangeSet::load(changes)?;
    let store = CatalogStore::new(layout.catalog_path());
    let _lock = store.lock()?;

    let mut catalog = store.load()?;
    let stats = changes.apply(&mut catalog)?;
    catalog.validate()?;
    let removed = catalog.prune_rejected();
    store.save(&catalog)?;

    let mut files_deleted = 0;
    for clip in &removed {
        let paths = std::iter::once(&clip.file_path).chain(clip.spectrogram_path.as_ref());
        for relative in paths {
            let path = layout.resolve(relative);
            if !path.exists() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Deleted {relative}");
                    files_deleted += 1;
                }
                Err(e) => warn!("Failed to delete {}: {e}", path.display()),
            }
        }
    }

    info!(
        "Review applied: {} canonical, {} rejected, {} quality, {} vocalization change(s)",
        stats.canonical_changes, stats.rejections, stats.quality_changes, stats.vocalization_changes
    );
    Ok(ReviewOutcome {
        stats,
        removed: removed.len(),
        files_deleted,
    })
}

/// Execute the validate command.
///
/// Hard invariants fail immediately. Audit findings are printed and turn
/// into an error after the optional rewrite, which holds the catalog lock
/// from load to save.
pub fn validate(layout: &ProjectLayout, rewrite: bool) -> Result<AuditReport> {
    let store = CatalogStore::new(layout.catalog_path());
    let lock = rewrite.then(|| store.lock()).transpose()?;
    let catalog = store.load()?;
    catalog.validate()?;

    let report = audit(&catalog, layout.root());
    print_report(&report);

    if lock.is_some() {
        store.save(&catalog)?;
    }

    let issues = report.issue_count();
    if issues > 0 {
        return Err(Error::AuditFailed { issues });
    }
    Ok(report)
}

fn print_report(report: &AuditReport) {
    println!("Total clips: {}", report.total);
    println!("  Active: {}", report.active);
    println!("  Rejected: {}", report.rejected);
    println!("Species: {}", report.species);
    println!("Canonical clips: {}", report.canonicals);

    print_pairs("Missing audio", &report.missing_audio);
    print_pairs("Missing spectrograms", &report.missing_spectrograms);
    print_ids("Canonical clips that are not WAV files", &report.unreadable_canonicals);
    print_ids("Species without canonical", &report.species_without_canonical);

    let issues = report.issues();
    if issues.is_empty() {
        println!("All checks passed");
    } else {
        println!("{} issue(s) found:", issues.len());
        for issue in issues {
            println!("  - {issue}");
        }
    }
}

fn print_pairs(title: &str, items: &[(String, String)]) {
    if items.is_empty() {
        return;
    }
    println!("{title} ({}):", items.len());
    for (id, path) in items.iter().take(MAX_LISTED) {
        println!("  {id}: {path}");
    }
    if items.len() > MAX_LISTED {
        println!("  ... and {} more", items.len() - MAX_LISTED);
    }
}

fn print_ids(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{title} ({}):", items.len());
    for id in items.iter().take(MAX_LISTED) {
        println!("  {id}");
    }
    if items.len() > MAX_LISTED {
        println!("  ... and {} more", items.len() - MAX_LISTED);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::catalog::clips::tests::clip;
    use crate::config::PathsConfig;
    use tempfile::TempDir;

    fn setup(clips: Vec<crate::catalog::ClipMetadata>) -> (TempDir, ProjectLayout) {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path(), &PathsConfig::default(), None);
        CatalogStore::new(layout.catalog_path())
            .save(&Catalog::new(clips))
            .unwrap();
        (dir, layout)
    }

    #[test]
    fn review_prunes_rejected_and_deletes_files() {
        let (dir, layout) = setup(vec![clip("AMRO_1", "AMRO"), clip("AMRO_2", "AMRO")]);
        fs::create_dir_all(dir.path().join("data/clips")).unwrap();
        fs::write(dir.path().join("data/clips/AMRO_2.wav"), b"x").unwrap();

        let changes = dir.path().join("changes.json");
        fs::write(
            &changes,
            r#"{"modified": {"AMRO_1": {"canonical": true}, "AMRO_2": {"rejected": true}}}"#,
        )
        .unwrap();

        let outcome = review(&changes, &layout).unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.files_deleted, 1);
        assert!(!dir.path().join("data/clips/AMRO_2.wav").exists());

        let catalog = CatalogStore::new(layout.catalog_path()).load().unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.clips()[0].canonical);
    }

    #[test]
    fn review_refuses_second_canonical() {
        let mut first = clip("AMRO_1", "AMRO");
        first.canonical = true;
        let (dir, layout) = setup(vec![first, clip("AMRO_2", "AMRO")]);
        let before = fs::read_to_string(layout.catalog_path()).unwrap();

        let changes = dir.path().join("changes.json");
        fs::write(&changes, r#"{"modified": {"AMRO_2": {"canonical": true}}}"#).unwrap();

        let err = review(&changes, &layout).unwrap_err();
        assert!(matches!(err, Error::MultipleCanonicals { .. }));
        assert_eq!(fs::read_to_string(layout.catalog_path()).unwrap(), before);
    }

    #[test]
    fn validate_reports_audit_issues() {
        let (_dir, layout) = setup(vec![clip("AMRO_1", "AMRO")]);
        let err = validate(&layout, false).unwrap_err();
        assert!(matches!(err, Error::AuditFailed { issues: 2 }));
    }

    #[test]
    fn validate_rewrite_refuses_locked_catalog() {
        let mut first = clip("AMRO_1", "AMRO");
        first.canonical = true;
        let (_dir, layout) = setup(vec![first]);
        let store = CatalogStore::new(layout.catalog_path());
        let before = fs::read_to_string(layout.catalog_path()).unwrap();

        let held = store.lock().unwrap();
        let err = validate(&layout, true).unwrap_err();
        assert!(matches!(err, Error::CatalogLocked { .. }));
        assert_eq!(fs::read_to_string(layout.catalog_path()).unwrap(), before);

        drop(held);
        let err = validate(&layout, true).unwrap_err();
        assert!(matches!(err, Error::AuditFailed { issues: 1 }));
        assert!(store.backup_path().exists());
        assert!(!crate::locking::FileLock::is_locked(layout.catalog_path()));
    }

    #[test]
    fn merge_appends_candidates() {
        let (dir, layout) = setup(vec![clip("AMRO_1", "AMRO")]);
        let candidates = dir.path().join("candidates.json");
        fs::write(
            &candidates,
            serde_json::to_string(&vec![clip("BLJA_1", "BLJA")]).unwrap(),
        )
        .unwrap();

        let report = merge(&candidates, &layout).unwrap();
        assert_eq!((report.before, report.added, report.after), (1, 1, 2));
    }
}
