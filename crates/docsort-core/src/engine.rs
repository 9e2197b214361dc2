use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::classify::{Classifier, PassOutcome};
use crate::config::AppConfig;
use crate::error::Error;
use crate::extract::{extract_document, PdfTextExtractor, TextExtractor};
use crate::model::{ClassificationResult, Document};
use crate::placement::{
    build_alphabetical_view, flatten_buckets, FlattenStats, Materializer, PlacementDecision,
    PlacementPlanner, PlacementStats,
};
use crate::progress::ProgressReporter;
use crate::report::{self, RunSummary};
use crate::scanner;

pub struct SortEngine {
    config: AppConfig,
    classifier: Classifier,
    extractor: Arc<dyn TextExtractor>,
}

/// Documents and their final classifications, index-aligned and sorted by path.
#[derive(Debug)]
pub struct ClassifyOutcome {
    pub documents: Vec<Document>,
    pub results: Vec<ClassificationResult>,
    pub passes: Vec<PassOutcome>,
    pub scan_duration: Duration,
    pub classify_duration: Duration,
    pub recovery_duration: Duration,
}

#[derive(Debug)]
pub struct RunResult {
    pub summary: RunSummary,
    pub decisions: Vec<PlacementDecision>,
    pub placement: PlacementStats,
    pub alphabetical: Option<PlacementStats>,
    pub scan_duration: Duration,
    pub classify_duration: Duration,
    pub recovery_duration: Duration,
    pub place_duration: Duration,
}

impl SortEngine {
    /// Fails only on configuration problems: a broken catalog or an invalid
    /// boilerplate pattern.
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let classifier = Classifier::from_config(&config)?;
        Ok(Self {
            config,
            classifier,
            extractor: Arc::new(PdfTextExtractor),
        })
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    fn organized_root(&self) -> PathBuf {
        self.config
            .output_root()
            .join(&self.config.layout.organized_dir)
    }

    /// Scan, extract and classify every source PDF, then run the recovery passes.
    /// Per-document failures end up as unclassified results, never as errors.
    pub fn classify_all(&self, reporter: &dyn ProgressReporter) -> Result<ClassifyOutcome, Error> {
        let source_dir = PathBuf::from(&self.config.source_dir);
        let ignore_pattern_slices: Vec<&str> =
            self.config.ignore_patterns.iter().map(|s| s.as_str()).collect();

        // Phase 1: Scan
        info!("Scanning {}...", source_dir.display());
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let files = scanner::list_source_pdfs(&source_dir, &ignore_pattern_slices)?;
        let scan_duration = scan_start.elapsed();
        reporter.on_scan_complete(files.len(), scan_duration.as_secs_f64());
        debug!(
            "Scan completed in {:.2}s — {} PDFs",
            scan_duration.as_secs_f64(),
            files.len()
        );

        // Phase 2: Extract + classify
        info!("Classifying {} documents...", files.len());
        reporter.on_classify_start(files.len());
        let classify_start = Instant::now();
        let done = AtomicUsize::new(0);
        let classified: Vec<(Document, ClassificationResult)> = files
            .par_iter()
            .map(|path| {
                let document =
                    extract_document(path, self.extractor.as_ref(), self.classifier.normalizer());
                let result = self.classifier.classify(&document);
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.on_classify_progress(finished, files.len());
                (document, result)
            })
            .collect();
        let (documents, mut results): (Vec<_>, Vec<_>) = classified.into_iter().unzip();
        let classify_duration = classify_start.elapsed();
        let initially_classified = results.iter().filter(|r| r.is_classified()).count();
        reporter.on_classify_complete(initially_classified, classify_duration.as_secs_f64());
        debug!(
            "Initial classification completed in {:.2}s — {} of {} classified",
            classify_duration.as_secs_f64(),
            initially_classified,
            results.len()
        );

        // Phase 3: Recovery passes
        info!("Running recovery passes...");
        let recovery_start = Instant::now();
        let passes = self.classifier.recover(&documents, &mut results, reporter);
        let recovery_duration = recovery_start.elapsed();

        Ok(ClassifyOutcome {
            documents,
            results,
            passes,
            scan_duration,
            classify_duration,
            recovery_duration,
        })
    }

    /// Full pipeline: classification, placement, optional alphabetical view
    /// and reports.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunResult, Error> {
        let outcome = self.classify_all(reporter)?;
        let output_root = self.config.output_root();

        // Phase 4: Placement
        info!("Placing documents under {}...", output_root.display());
        let place_start = Instant::now();
        let mut planner = PlacementPlanner::new(&self.config.layout, &output_root);
        let decisions = planner.plan(&outcome.documents, &outcome.results);
        let placement = Materializer::new(self.config.transfer_mode, self.config.dry_run)
            .apply(&decisions, reporter);

        let alphabetical = if self.config.alphabetical_view {
            Some(self.build_alphabetical_view()?)
        } else {
            None
        };
        let place_duration = place_start.elapsed();

        let summary = RunSummary::from_results(
            &PathBuf::from(&self.config.source_dir),
            &outcome.results,
            outcome.passes,
        )
        .with_placement(placement.clone());

        if self.config.write_reports && !self.config.dry_run {
            summary.write_json(&output_root.join(report::SUMMARY_FILE))?;
            report::write_csv_report(
                &output_root.join(report::CSV_REPORT_FILE),
                &outcome.results,
                Some(&decisions),
            )?;
        }

        info!(
            "Run complete: {} documents, {} classified ({:.1}%), {} placed, {} already placed, {} failed",
            summary.total_documents,
            summary.classified,
            summary.accuracy_percent,
            placement.placed,
            placement.already_placed,
            placement.failed
        );

        Ok(RunResult {
            summary,
            decisions,
            placement,
            alphabetical,
            scan_duration: outcome.scan_duration,
            classify_duration: outcome.classify_duration,
            recovery_duration: outcome.recovery_duration,
            place_duration,
        })
    }

    pub fn build_alphabetical_view(&self) -> Result<PlacementStats, Error> {
        let alphabetical_root = self
            .config
            .output_root()
            .join(&self.config.layout.alphabetical_dir);
        Ok(build_alphabetical_view(
            &self.organized_root(),
            &alphabetical_root,
            self.config.dry_run,
        )?)
    }

    pub fn flatten(&self) -> Result<FlattenStats, Error> {
        Ok(flatten_buckets(&self.organized_root(), self.config.dry_run)?)
    }
}
