//! Document upload → clinical field extraction.
//!
//! Errors use a flat `{"error": "<message>"}` body; the assessment form
//! reads that field directly to show the failure.

use std::collections::BTreeMap;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::pipeline::extraction::{document_text, extract_fields, ClinicalField, ExtractionError};
use crate::pipeline::import::{classify_upload, ImportError, StagedUpload};

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
struct FlatError {
    error: String,
}

/// Failure of the OCR endpoint, rendered with the flat error body.
#[derive(Debug)]
pub struct OcrFailure {
    status: StatusCode,
    message: String,
}

impl OcrFailure {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    fn no_file_part() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "No file part")
    }

    fn no_selected_file() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "No selected file")
    }

    fn ocr_unavailable() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "OCR system not available")
    }

    fn processing_failed() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process file")
    }
}

impl IntoResponse for OcrFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(FlatError {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for OcrFailure {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

/// Why reading an upload failed, before it is flattened for the client.
#[derive(Debug, thiserror::Error)]
enum ProcessError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// `POST /api/ocr-process`
pub async fn process(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<BTreeMap<ClinicalField, String>>, OcrFailure> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(OcrFailure::no_file_part)?;
    if file_name.is_empty() {
        return Err(OcrFailure::no_selected_file());
    }

    let kind = classify_upload(&file_name);
    let ocr = ctx.core.ocr_engine();
    if kind.needs_ocr() && ocr.is_none() {
        return Err(OcrFailure::ocr_unavailable());
    }

    let upload_dir = ctx.core.config.upload_dir();
    let max_bytes = ctx.core.config.max_upload_bytes;
    let outcome = tokio::task::spawn_blocking(move || -> Result<_, ProcessError> {
        // Dropping the staged upload removes the file on every path
        let staged = StagedUpload::write(&upload_dir, &file_name, &bytes, max_bytes)?;
        let text = document_text(staged.path(), staged.kind(), ocr.as_deref())?;
        Ok(extract_fields(&text))
    })
    .await;

    match outcome {
        Ok(Ok(fields)) => {
            tracing::info!(kind = kind.as_str(), fields = fields.len(), "Document processed");
            Ok(Json(fields))
        }
        Ok(Err(ProcessError::Extraction(ExtractionError::OcrUnavailable))) => {
            Err(OcrFailure::ocr_unavailable())
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, kind = kind.as_str(), "Document processing failed");
            Err(OcrFailure::processing_failed())
        }
        Err(e) => {
            tracing::error!(error = %e, "Document processing task failed");
            Err(OcrFailure::processing_failed())
        }
    }
}
