use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

use super::planner::{PlacementAction, PlacementDecision};
use crate::config::TransferMode;
use crate::progress::ProgressReporter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlacementStats {
    pub placed: usize,
    pub already_placed: usize,
    /// Placed under a numbered name after a collision.
    pub renamed: usize,
    pub failed: usize,
}

/// Carries out placement decisions on disk. Never overwrites: targets are
/// opened with `create_new`.
pub struct Materializer {
    mode: TransferMode,
    dry_run: bool,
}

impl Materializer {
    pub fn new(mode: TransferMode, dry_run: bool) -> Self {
        Self { mode, dry_run }
    }

    /// Per-file failures are logged and counted; the batch always completes.
    pub fn apply(
        &self,
        decisions: &[PlacementDecision],
        reporter: &dyn ProgressReporter,
    ) -> PlacementStats {
        let start = Instant::now();
        let mut stats = PlacementStats::default();
        reporter.on_place_start(decisions.len());

        for (done, decision) in decisions.iter().enumerate() {
            match &decision.action {
                PlacementAction::AlreadyPlaced { existing } => {
                    debug!(
                        "Skipping {}: identical to {}",
                        decision.document_id.display(),
                        existing.display()
                    );
                    stats.already_placed += 1;
                }
                PlacementAction::Place => {
                    let target = decision.target();
                    if self.dry_run {
                        info!(
                            "[dry run] {} -> {}",
                            decision.document_id.display(),
                            target.display()
                        );
                        stats.placed += 1;
                        stats.renamed += usize::from(decision.renamed);
                    } else {
                        match self.transfer(&decision.document_id, &target) {
                            Ok(()) => {
                                debug!(
                                    "{} -> {}",
                                    decision.document_id.display(),
                                    target.display()
                                );
                                stats.placed += 1;
                                stats.renamed += usize::from(decision.renamed);
                            }
                            Err(e) => {
                                error!(
                                    "Failed to place {} at {}: {}",
                                    decision.document_id.display(),
                                    target.display(),
                                    e
                                );
                                stats.failed += 1;
                            }
                        }
                    }
                }
            }
            reporter.on_place_progress(done + 1, decisions.len());
        }

        reporter.on_place_complete(stats.placed, start.elapsed().as_secs_f64());
        stats
    }

    pub fn transfer(&self, source: &Path, target: &Path) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        match self.mode {
            TransferMode::Copy => copy_new(source, target),
            TransferMode::Move => move_new(source, target),
        }
    }
}

/// Copy into a file that must not exist yet.
pub fn copy_new(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;
    io::copy(&mut reader, &mut writer)?;
    Ok(())
}

/// Rename when possible, otherwise copy and remove the source.
pub fn move_new(source: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        ));
    }
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                "Rename {} failed ({}), copying instead",
                source.display(),
                e
            );
            copy_new(source, target)?;
            fs::remove_file(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn decision(source: &Path, bucket: &Path, name: &str) -> PlacementDecision {
        PlacementDecision {
            document_id: source.to_path_buf(),
            bucket: bucket.to_path_buf(),
            file_name: name.to_string(),
            action: PlacementAction::Place,
            renamed: false,
        }
    }

    #[test]
    fn test_copy_never_overwrites() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        let target = dir.path().join("b.pdf");
        fs::write(&source, b"new").unwrap();
        fs::write(&target, b"old").unwrap();

        let err = copy_new(&source, &target).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_apply_copy_and_move() {
        let dir = tempdir().unwrap();
        let bucket = dir.path().join("out").join("Teams");
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        fs::write(&first, b"1").unwrap();
        fs::write(&second, b"2").unwrap();

        let copier = Materializer::new(TransferMode::Copy, false);
        let stats = copier.apply(&[decision(&first, &bucket, "Teams - a.pdf")], &SilentReporter);
        assert_eq!(stats.placed, 1);
        assert!(first.exists(), "copy must keep the source");
        assert!(bucket.join("Teams - a.pdf").exists());

        let mover = Materializer::new(TransferMode::Move, false);
        let stats = mover.apply(&[decision(&second, &bucket, "Teams - b.pdf")], &SilentReporter);
        assert_eq!(stats.placed, 1);
        assert!(!second.exists(), "move must remove the source");
        assert_eq!(fs::read(bucket.join("Teams - b.pdf")).unwrap(), b"2");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        fs::write(&source, b"a").unwrap();
        let bucket = dir.path().join("out");

        let stats = Materializer::new(TransferMode::Move, true)
            .apply(&[decision(&source, &bucket, "x.pdf")], &SilentReporter);
        assert_eq!(stats.placed, 1);
        assert!(source.exists());
        assert!(!bucket.exists());
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let dir = tempdir().unwrap();
        let bucket = dir.path().join("out");
        let missing = PathBuf::from("/nonexistent/ghost.pdf");
        let present = dir.path().join("real.pdf");
        fs::write(&present, b"r").unwrap();

        let stats = Materializer::new(TransferMode::Copy, false).apply(
            &[
                decision(&missing, &bucket, "ghost.pdf"),
                decision(&present, &bucket, "real.pdf"),
            ],
            &SilentReporter,
        );
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.placed, 1);
    }
}
