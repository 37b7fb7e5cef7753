use std::path::Path;

use super::ExtractionError;

/// Text recognized on one image, one entry per line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrPageResult {
    pub lines: Vec<String>,
    /// Mean engine confidence, 0.0-1.0.
    pub confidence: f32,
}

impl OcrPageResult {
    /// Recognized lines joined by a single space.
    pub fn joined(&self) -> String {
        self.lines.join(" ")
    }
}

/// OCR engine seam. The server holds at most one, shared across requests.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_path: &Path) -> Result<OcrPageResult, ExtractionError>;
}

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: Option<std::path::PathBuf>,
    lang: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// `tessdata_dir` of `None` lets Tesseract use its compiled-in default.
    pub fn new(tessdata_dir: Option<&Path>) -> Result<Self, ExtractionError> {
        if let Some(dir) = tessdata_dir {
            if !dir.join("eng.traineddata").exists() {
                return Err(ExtractionError::TessdataNotFound(dir.to_path_buf()));
            }
        }
        let engine = Self {
            tessdata_dir: tessdata_dir.map(Path::to_path_buf),
            lang: "eng".to_string(),
        };
        // Fail at startup rather than on the first upload
        engine.open()?;
        Ok(engine)
    }

    fn open(&self) -> Result<tesseract::Tesseract, ExtractionError> {
        let datapath = match &self.tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?,
            ),
            None => None,
        };
        tesseract::Tesseract::new(datapath, Some(&self.lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    fn recognize(&self, image_path: &Path) -> Result<OcrPageResult, ExtractionError> {
        let path_str = image_path
            .to_str()
            .ok_or_else(|| ExtractionError::OcrProcessing("Invalid image path".into()))?;

        let mut tess = self
            .open()?
            .set_image(path_str)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;
        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        Ok(OcrPageResult {
            lines: split_lines(&text),
            confidence,
        })
    }
}

/// Non-blank lines of engine output, trimmed.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Mock OCR engine for unit testing without Tesseract.
#[cfg(test)]
pub struct MockOcrEngine {
    pub text: String,
    pub fail: bool,
}

#[cfg(test)]
impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
        }
    }
}

#[cfg(test)]
impl OcrEngine for MockOcrEngine {
    fn recognize(&self, image_path: &Path) -> Result<OcrPageResult, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::OcrProcessing("mock failure".into()));
        }
        // Reading the file mirrors the real engine touching the staged upload
        std::fs::metadata(image_path)?;
        Ok(OcrPageResult {
            lines: split_lines(&self.text),
            confidence: 0.9,
        })
    }
}
