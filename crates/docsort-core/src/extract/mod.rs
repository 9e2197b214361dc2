mod pdf;

pub use pdf::PdfTextExtractor;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::classify::normalize::Normalizer;
use crate::model::{Document, ExtractionStatus};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("primary extraction failed ({primary}); fallback failed ({fallback})")]
    Failed { primary: String, fallback: String },
}

/// Pulls plain text out of a source file. Implementations must not panic
/// across this boundary; a failure is reported per document.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extract, normalize and wrap one source file. Never fails: extraction errors
/// become `ExtractionStatus::ExtractionFailed` on the returned document.
pub fn extract_document(
    path: &Path,
    extractor: &dyn TextExtractor,
    normalizer: &Normalizer,
) -> Document {
    match extractor.extract_text(path) {
        Ok(raw) => document_from_text(path.to_path_buf(), raw, normalizer),
        Err(e) => {
            warn!("Text extraction failed for {}: {}", path.display(), e);
            Document {
                id: path.to_path_buf(),
                raw_text: None,
                text: Default::default(),
                status: ExtractionStatus::ExtractionFailed,
                failure: Some(e.to_string()),
            }
        }
    }
}

pub fn document_from_text(id: PathBuf, raw: String, normalizer: &Normalizer) -> Document {
    let text = normalizer.normalize(&raw);
    let status = if text.is_empty() {
        ExtractionStatus::Empty
    } else {
        ExtractionStatus::Ok
    };
    Document {
        id,
        raw_text: Some(raw),
        text,
        status,
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;

    struct Failing;

    impl TextExtractor for Failing {
        fn extract_text(&self, _path: &Path) -> Result<String, ExtractError> {
            Err(ExtractError::Failed {
                primary: "bad xref".to_string(),
                fallback: "no pages".to_string(),
            })
        }
    }

    #[test]
    fn test_failure_is_recorded_on_document() {
        let normalizer = Normalizer::from_config(&NormalizerConfig::default()).unwrap();
        let doc = extract_document(Path::new("broken.pdf"), &Failing, &normalizer);
        assert_eq!(doc.status, ExtractionStatus::ExtractionFailed);
        assert!(doc.raw_text.is_none());
        assert!(doc.failure.unwrap().contains("bad xref"));
    }

    #[test]
    fn test_status_follows_normalized_text() {
        let normalizer = Normalizer::from_config(&NormalizerConfig::default()).unwrap();
        let empty = document_from_text(PathBuf::from("a.pdf"), "  \n 3 \n".into(), &normalizer);
        assert_eq!(empty.status, ExtractionStatus::Empty);
        assert!(empty.raw_text.is_some());

        let ok = document_from_text(PathBuf::from("b.pdf"), "Outlook regler".into(), &normalizer);
        assert_eq!(ok.status, ExtractionStatus::Ok);
    }
}
