pub mod catalog;
mod catalog_data;
pub mod detect;
pub mod normalize;
pub mod recovery;
pub mod score;
pub mod similarity;

use std::sync::Arc;
use tracing::debug;

use crate::config::{AppConfig, MatchingConfig};
use crate::error::Error;
use crate::model::{ClassificationResult, Document, ExtractionStatus, ReasonCode};
use catalog::Catalog;
use detect::{DetectOptions, Detector};
use normalize::Normalizer;
use score::Scorer;
use similarity::{NormalizedLevenshtein, Similarity};

pub use recovery::{PassOutcome, RecoveryPass};

/// Everything needed to classify a document: the shared catalog, the text
/// normalizer, the similarity measure and the matching thresholds.
pub struct Classifier {
    catalog: Arc<Catalog>,
    normalizer: Normalizer,
    similarity: Arc<dyn Similarity>,
    matching: MatchingConfig,
}

impl Classifier {
    pub fn new(catalog: Arc<Catalog>, normalizer: Normalizer, matching: MatchingConfig) -> Self {
        Self {
            catalog,
            normalizer,
            similarity: Arc::new(NormalizedLevenshtein),
            matching,
        }
    }

    /// Catalog and boilerplate errors surface here and are fatal.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let catalog = Catalog::with_extra(&config.extra_systems)?;
        let normalizer = Normalizer::from_config(&config.normalizer)?;
        Ok(Self::new(
            Arc::new(catalog),
            normalizer,
            config.matching.clone(),
        ))
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn similarity(&self) -> &dyn Similarity {
        self.similarity.as_ref()
    }

    pub fn matching(&self) -> &MatchingConfig {
        &self.matching
    }

    pub fn detector(&self) -> Detector<'_> {
        Detector::new(&self.catalog, self.similarity.as_ref())
    }

    pub fn scorer(&self) -> Scorer<'_> {
        Scorer::new(&self.catalog, &self.matching)
    }

    /// Initial classification (pass 0).
    pub fn classify(&self, document: &Document) -> ClassificationResult {
        let id = document.id.clone();
        match document.status {
            ExtractionStatus::ExtractionFailed => {
                return ClassificationResult::unclassified(id, ReasonCode::ExtractionFailure, 0)
            }
            ExtractionStatus::Empty => {
                return ClassificationResult::unclassified(id, ReasonCode::EmptyContent, 0)
            }
            ExtractionStatus::Ok => {}
        }

        let evidence = self
            .detector()
            .detect(&document.text.matching, &DetectOptions::initial(&self.matching));
        let decision = self.scorer().decide(&evidence);

        debug!(
            "Classified {} as {} ({}, {} hits)",
            document.id.display(),
            decision.system.as_deref().unwrap_or(crate::model::UNCLASSIFIED),
            decision.confidence,
            evidence.len()
        );

        ClassificationResult {
            document_id: id,
            system: decision.system,
            evidence,
            confidence: decision.confidence,
            pass: 0,
            reason: decision.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Confidence;
    use std::path::PathBuf;

    fn classifier() -> Classifier {
        Classifier::from_config(&AppConfig::default()).unwrap()
    }

    fn document(text: &str) -> Document {
        crate::extract::document_from_text(
            PathBuf::from("doc.pdf"),
            text.to_string(),
            classifier().normalizer(),
        )
    }

    #[test]
    fn test_failed_and_empty_documents() {
        let c = classifier();
        let mut doc = document("");
        assert_eq!(c.classify(&doc).reason, Some(ReasonCode::EmptyContent));

        doc.status = ExtractionStatus::ExtractionFailed;
        let result = c.classify(&doc);
        assert_eq!(result.reason, Some(ReasonCode::ExtractionFailure));
        assert_eq!(result.pass, 0);
    }

    #[test]
    fn test_boilerplate_only_is_empty() {
        let doc = document("Sist oppdatert 01.01.2024\n12.05.2023\nSide 1 av 1");
        assert_eq!(doc.status, ExtractionStatus::Empty);
        assert_eq!(
            classifier().classify(&doc).reason,
            Some(ReasonCode::EmptyContent)
        );
    }

    #[test]
    fn test_classifies_alias_near_top() {
        let doc = document("Slik MS Teams brukes i møter");
        let result = classifier().classify(&doc);
        assert_eq!(result.system.as_deref(), Some("Teams"));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_invalid_boilerplate_pattern_is_fatal() {
        let mut config = AppConfig::default();
        config.normalizer.boilerplate_patterns = vec!["[".to_string()];
        assert!(matches!(
            Classifier::from_config(&config),
            Err(Error::Pattern(_))
        ));
    }
}
