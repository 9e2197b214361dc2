use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use super::index::BucketIndex;
use super::materialize::{copy_new, move_new, PlacementStats};
use crate::scanner::is_pdf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenStats {
    pub moved: usize,
    pub renamed: usize,
    pub removed_dirs: usize,
    pub failed: usize,
}

/// Copy every PDF below `organized_root` into the single flat directory
/// `alphabetical_root`, in lowercase file-name order. Files whose content is
/// already there are skipped.
pub fn build_alphabetical_view(
    organized_root: &Path,
    alphabetical_root: &Path,
    dry_run: bool,
) -> io::Result<PlacementStats> {
    let mut stats = PlacementStats::default();
    if !organized_root.is_dir() {
        return Ok(stats);
    }

    let mut sources: Vec<PathBuf> = WalkDir::new(organized_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    sources.sort_by_key(|path| {
        (
            path.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
            path.clone(),
        )
    });

    let mut index = BucketIndex::load(alphabetical_root)?;
    if !dry_run {
        fs::create_dir_all(alphabetical_root)?;
    }

    for source in sources {
        match index.find_identical(&source) {
            Ok(Some(existing)) => {
                debug!("{} already in view as {}", source.display(), existing.display());
                stats.already_placed += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                error!("Cannot compare {}: {}", source.display(), e);
                stats.failed += 1;
                continue;
            }
        }

        let desired = file_name_of(&source);
        let (name, renamed) = index.claim(&desired);
        let target = alphabetical_root.join(&name);

        if dry_run {
            info!("[dry run] {} -> {}", source.display(), target.display());
        } else if let Err(e) = copy_new(&source, &target) {
            error!("Failed to copy {} to {}: {}", source.display(), target.display(), e);
            stats.failed += 1;
            continue;
        } else {
            let size = fs::metadata(&target).map(|m| m.len()).unwrap_or(0);
            index.record(target, size);
        }
        stats.placed += 1;
        stats.renamed += usize::from(renamed);
    }

    info!(
        "Alphabetical view: {} copied, {} already present, {} failed",
        stats.placed, stats.already_placed, stats.failed
    );
    Ok(stats)
}

/// Move PDFs nested anywhere below a bucket up into the bucket itself, then
/// remove the sub-directories left empty. Buckets are the immediate children
/// of `organized_root`.
pub fn flatten_buckets(organized_root: &Path, dry_run: bool) -> io::Result<FlattenStats> {
    let mut stats = FlattenStats::default();
    if !organized_root.is_dir() {
        return Ok(stats);
    }

    let mut buckets: Vec<PathBuf> = fs::read_dir(organized_root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    buckets.sort();

    for bucket in buckets {
        flatten_one(&bucket, dry_run, &mut stats)?;
    }

    info!(
        "Flatten: {} moved, {} renamed, {} directories removed, {} failed",
        stats.moved, stats.renamed, stats.removed_dirs, stats.failed
    );
    Ok(stats)
}

fn flatten_one(bucket: &Path, dry_run: bool, stats: &mut FlattenStats) -> io::Result<()> {
    let mut nested: Vec<PathBuf> = WalkDir::new(bucket)
        .min_depth(2)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    if nested.is_empty() {
        return Ok(());
    }
    nested.sort();

    let mut index = BucketIndex::load(bucket)?;
    for source in nested {
        let (name, renamed) = index.claim(&file_name_of(&source));
        let target = bucket.join(&name);

        if dry_run {
            info!("[dry run] {} -> {}", source.display(), target.display());
        } else if let Err(e) = move_new(&source, &target) {
            error!("Failed to move {} to {}: {}", source.display(), target.display(), e);
            stats.failed += 1;
            continue;
        }
        stats.moved += 1;
        stats.renamed += usize::from(renamed);
    }

    if dry_run {
        return Ok(());
    }

    // deepest first, so parents empty out after their children
    let dirs: Vec<PathBuf> = WalkDir::new(bucket)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();
    for dir in dirs {
        let is_empty = fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty && fs::remove_dir(&dir).is_ok() {
            stats.removed_dirs += 1;
        }
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_alphabetical_view_is_idempotent() {
        let dir = tempdir().unwrap();
        let organized = dir.path().join("organized_by_system");
        let alpha = dir.path().join("alphabetical_all_pdfs");
        fs::create_dir_all(organized.join("Teams")).unwrap();
        fs::create_dir_all(organized.join("Outlook")).unwrap();
        fs::write(organized.join("Teams").join("guide.pdf"), b"teams guide").unwrap();
        fs::write(organized.join("Outlook").join("guide.pdf"), b"outlook guide").unwrap();

        let first = build_alphabetical_view(&organized, &alpha, false).unwrap();
        assert_eq!(first.placed, 2);
        assert_eq!(first.renamed, 1);
        assert!(alpha.join("guide.pdf").exists());
        assert!(alpha.join("guide (2).pdf").exists());

        let second = build_alphabetical_view(&organized, &alpha, false).unwrap();
        assert_eq!(second.placed, 0);
        assert_eq!(second.already_placed, 2);
    }

    #[test]
    fn test_flatten_moves_nested_files_up() {
        let dir = tempdir().unwrap();
        let organized = dir.path().join("organized_by_system");
        let nested = organized.join("SIAN").join("Innlogging").join("Eldre");
        fs::create_dir_all(&nested).unwrap();
        fs::write(organized.join("SIAN").join("a.pdf"), b"top").unwrap();
        fs::write(nested.join("a.pdf"), b"deep").unwrap();
        fs::write(nested.join("b.pdf"), b"deep b").unwrap();

        let stats = flatten_buckets(&organized, false).unwrap();
        assert_eq!(stats.moved, 2);
        assert_eq!(stats.renamed, 1);
        assert_eq!(stats.removed_dirs, 2);

        let sian = organized.join("SIAN");
        assert_eq!(fs::read(sian.join("a.pdf")).unwrap(), b"top");
        assert_eq!(fs::read(sian.join("a (2).pdf")).unwrap(), b"deep");
        assert!(sian.join("b.pdf").exists());
        assert!(!sian.join("Innlogging").exists());
    }
}
