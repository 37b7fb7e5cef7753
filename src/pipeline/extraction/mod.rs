pub mod document;
pub mod docx;
pub mod fields;
pub mod ocr;

pub use document::document_text;
pub use fields::{extract_fields, ClinicalField};
pub use ocr::{OcrEngine, OcrPageResult};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("OCR system not available")]
    OcrUnavailable,

    #[error("Tessdata not found at {0}")]
    TessdataNotFound(std::path::PathBuf),

    #[error("Word document unreadable: {0}")]
    Docx(String),

    #[error("Text is not valid UTF-8")]
    EncodingError,
}
