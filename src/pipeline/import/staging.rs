//! Transient on-disk copies of uploads.
//!
//! An uploaded document only lives on disk while it is being read. The
//! staged file is a `tempfile::NamedTempFile` inside the upload directory,
//! so it is removed when the `StagedUpload` is dropped, on every path.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::format::{classify_upload, sanitize_filename, DocumentKind};
use super::ImportError;

#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    original_name: String,
    kind: DocumentKind,
}

impl StagedUpload {
    /// Write `bytes` into `upload_dir` under a unique name derived from
    /// the sanitized client file name.
    pub fn write(
        upload_dir: &Path,
        file_name: &str,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<Self, ImportError> {
        if file_name.is_empty() {
            return Err(ImportError::EmptyFileName);
        }
        if bytes.len() > max_bytes {
            return Err(ImportError::FileTooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }

        std::fs::create_dir_all(upload_dir)?;
        let safe_name = sanitize_filename(file_name);
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!("-{safe_name}"))
            .tempfile_in(upload_dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(
            path = %file.path().display(),
            size = bytes.len(),
            "Upload staged"
        );

        Ok(Self {
            file,
            original_name: file_name.to_string(),
            kind: classify_upload(file_name),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}
