use ahash::AHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::index::BucketIndex;
use super::layout::{classified_file_name, sanitize_component, unclassified_file_name};
use crate::classify::normalize::derive_title;
use crate::config::LayoutConfig;
use crate::model::{ClassificationResult, Document, ReasonCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementAction {
    Place,
    /// Identical content is already in the bucket under `existing`.
    AlreadyPlaced { existing: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDecision {
    pub document_id: PathBuf,
    /// Flat bucket directory: `<output>/<organized_dir>/<bucket>`.
    pub bucket: PathBuf,
    pub file_name: String,
    pub action: PlacementAction,
    /// A numeric suffix was added to avoid a collision.
    pub renamed: bool,
}

impl PlacementDecision {
    pub fn target(&self) -> PathBuf {
        self.bucket.join(&self.file_name)
    }
}

/// Maps final results to bucket paths and collision-free file names. Plans
/// sequentially so numbered suffixes are assigned in document order.
pub struct PlacementPlanner<'a> {
    layout: &'a LayoutConfig,
    organized_root: PathBuf,
    buckets: AHashMap<String, BucketIndex>,
}

impl<'a> PlacementPlanner<'a> {
    pub fn new(layout: &'a LayoutConfig, output_root: &Path) -> Self {
        Self {
            layout,
            organized_root: output_root.join(&layout.organized_dir),
            buckets: AHashMap::new(),
        }
    }

    pub fn organized_root(&self) -> &Path {
        &self.organized_root
    }

    /// Bucket for a result. Low-confidence results keep their top system;
    /// unreadable or empty documents go to the failure bucket.
    pub fn bucket_name(&self, result: &ClassificationResult) -> String {
        match (&result.system, result.reason) {
            (Some(system), _) => {
                let name = sanitize_component(system);
                if name.is_empty() {
                    self.layout.unclassified_bucket.clone()
                } else {
                    name
                }
            }
            (None, Some(ReasonCode::ExtractionFailure | ReasonCode::EmptyContent)) => {
                self.layout.failed_bucket.clone()
            }
            (None, _) => self.layout.unclassified_bucket.clone(),
        }
    }

    pub fn file_name(&self, document: &Document, result: &ClassificationResult) -> String {
        let stem = document.file_stem();
        match &result.system {
            Some(system) => {
                let title = derive_title(&document.text.display, Some(system));
                classified_file_name(system, title.as_deref(), &stem, self.layout.title_max_chars)
            }
            None => unclassified_file_name(&stem, self.layout.title_max_chars),
        }
    }

    /// One decision per document, in input order. `results` must be parallel
    /// to `documents`.
    pub fn plan(
        &mut self,
        documents: &[Document],
        results: &[ClassificationResult],
    ) -> Vec<PlacementDecision> {
        documents
            .iter()
            .zip(results)
            .map(|(document, result)| self.plan_one(document, result))
            .collect()
    }

    fn plan_one(&mut self, document: &Document, result: &ClassificationResult) -> PlacementDecision {
        let bucket_name = self.bucket_name(result);
        let bucket = self.organized_root.join(&bucket_name);
        let desired = self.file_name(document, result);

        let index = self
            .buckets
            .entry(bucket_name)
            .or_insert_with(|| match BucketIndex::load(&bucket) {
                Ok(index) => index,
                Err(e) => {
                    warn!("Cannot index bucket {}: {}", bucket.display(), e);
                    BucketIndex::default()
                }
            });

        let existing = match index.find_identical(document.path()) {
            Ok(existing) => existing,
            Err(e) => {
                warn!("Cannot compare {}: {}", document.path().display(), e);
                None
            }
        };

        if let Some(existing) = existing {
            debug!(
                "{} already placed as {}",
                document.path().display(),
                existing.display()
            );
            let file_name = existing
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(desired);
            return PlacementDecision {
                document_id: document.id.clone(),
                bucket,
                file_name,
                action: PlacementAction::AlreadyPlaced { existing },
                renamed: false,
            };
        }

        let (file_name, renamed) = index.claim(&desired);
        if renamed {
            debug!("Name collision in {}: {} -> {}", bucket.display(), desired, file_name);
        }

        PlacementDecision {
            document_id: document.id.clone(),
            bucket,
            file_name,
            action: PlacementAction::Place,
            renamed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Confidence, ExtractionStatus, NormalizedText};

    fn document(path: &str, display: &str) -> Document {
        Document {
            id: PathBuf::from(path),
            raw_text: Some(display.to_string()),
            text: NormalizedText {
                matching: display.to_lowercase(),
                display: display.to_string(),
            },
            status: ExtractionStatus::Ok,
            failure: None,
        }
    }

    fn result(path: &str, system: Option<&str>, reason: Option<ReasonCode>) -> ClassificationResult {
        ClassificationResult {
            document_id: PathBuf::from(path),
            system: system.map(str::to_string),
            evidence: Vec::new(),
            confidence: Confidence::Low,
            pass: 0,
            reason,
        }
    }

    #[test]
    fn test_bucket_names() {
        let layout = LayoutConfig::default();
        let planner = PlacementPlanner::new(&layout, Path::new("/out"));
        assert_eq!(planner.bucket_name(&result("a", Some("SIAN"), None)), "SIAN");
        assert_eq!(
            planner.bucket_name(&result("a", None, Some(ReasonCode::EmptyContent))),
            "_weird_format_files"
        );
        assert_eq!(
            planner.bucket_name(&result("a", None, Some(ReasonCode::ExtractionFailure))),
            "_weird_format_files"
        );
        assert_eq!(
            planner.bucket_name(&result("a", None, Some(ReasonCode::NoCandidates))),
            "Other"
        );
    }

    #[test]
    fn test_file_names_follow_classification() {
        let layout = LayoutConfig::default();
        let planner = PlacementPlanner::new(&layout, Path::new("/out"));
        let doc = document("/in/side_3.pdf", "Outlook\nPassword reset guide\nSteg 1");

        assert_eq!(
            planner.file_name(&doc, &result("/in/side_3.pdf", Some("Outlook"), None)),
            "Outlook - Password reset guide.pdf"
        );
        assert_eq!(
            planner.file_name(&doc, &result("/in/side_3.pdf", None, Some(ReasonCode::NoCandidates))),
            "side_3.pdf"
        );
    }
}
