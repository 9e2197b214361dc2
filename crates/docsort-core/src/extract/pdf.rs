use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

use super::{ExtractError, TextExtractor};

/// pdf-extract first, lopdf page-by-page as the fallback. A blank primary
/// result also tries the fallback, since some producers only decode there.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path)?;

        let primary = match primary_extract(&bytes) {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            // Image-only pages: readable, but empty unless lopdf finds more
            Ok(blank) => return Ok(fallback_extract(&bytes).unwrap_or(blank)),
            Err(e) => e,
        };
        debug!("Primary extraction failed for {}: {}", path.display(), primary);

        fallback_extract(&bytes).map_err(|fallback| ExtractError::Failed { primary, fallback })
    }
}

fn primary_extract(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed fonts
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("extractor panicked".to_string()),
    }
}

fn fallback_extract(bytes: &[u8]) -> Result<String, String> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut document = lopdf::Document::load_mem(bytes).map_err(|e| e.to_string())?;
        let _ = document.decompress();

        let mut pages: Vec<u32> = document.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Err("no pages".to_string());
        }
        pages.sort_unstable();

        document.extract_text(&pages).map_err(|e| e.to_string())
    }));

    match outcome {
        Ok(result) => result,
        Err(_) => Err("fallback extractor panicked".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_read_error() {
        let result = PdfTextExtractor.extract_text(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(ExtractError::Read(_))));
    }

    #[test]
    fn test_garbage_bytes_fail_both_strategies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        fs::write(&path, b"this is not a pdf at all").unwrap();

        let result = PdfTextExtractor.extract_text(&path);
        assert!(matches!(result, Err(ExtractError::Failed { .. })));
    }
}
