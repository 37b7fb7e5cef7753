use std::path::Path;

use super::docx::docx_text;
use super::ocr::OcrEngine;
use super::ExtractionError;
use crate::pipeline::import::DocumentKind;

/// Read the text of a staged upload.
///
/// Word documents and text files are read directly. Images need an OCR
/// engine; without one the call fails with `OcrUnavailable`.
pub fn document_text(
    path: &Path,
    kind: DocumentKind,
    ocr: Option<&dyn OcrEngine>,
) -> Result<String, ExtractionError> {
    let text = match kind {
        DocumentKind::Docx => docx_text(path)?,
        DocumentKind::PlainText => {
            let bytes = std::fs::read(path)?;
            String::from_utf8(bytes).map_err(|_| ExtractionError::EncodingError)?
        }
        DocumentKind::Image => {
            let engine = ocr.ok_or(ExtractionError::OcrUnavailable)?;
            let page = engine.recognize(path)?;
            tracing::debug!(
                lines = page.lines.len(),
                confidence = page.confidence,
                "OCR complete"
            );
            page.joined()
        }
    };

    tracing::debug!(kind = kind.as_str(), chars = text.len(), "Document text read");
    Ok(text)
}
