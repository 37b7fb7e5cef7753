//! Shared application state.
//!
//! `CoreState` is built once at startup and wrapped in `Arc`. It owns the
//! configuration, the loaded risk model, the OCR engine (when available)
//! and the audit buffer. Database connections are opened per call.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;

use crate::config::AppConfig;
use crate::db;
use crate::db::repository::AuditRecord;
use crate::pipeline::extraction::OcrEngine;
use crate::risk::{LogisticRiskModel, RiskModel};

/// Maximum audit buffer size before flush.
const AUDIT_BUFFER_CAPACITY: usize = 100;

/// Audit rows older than this are pruned on flush.
const AUDIT_RETENTION_DAYS: i64 = 90;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: AppConfig,
    /// `None` when the artifact was missing or invalid at startup.
    risk_model: Option<Arc<dyn RiskModel>>,
    /// `None` when built without OCR or Tesseract failed to initialize.
    ocr: Option<Arc<dyn OcrEngine>>,
    /// Audit log for every API request.
    audit: AuditLogger,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        risk_model: Option<Arc<dyn RiskModel>>,
        ocr: Option<Arc<dyn OcrEngine>>,
    ) -> Self {
        Self {
            config,
            risk_model,
            ocr,
            audit: AuditLogger::default(),
        }
    }

    /// Load the risk model and OCR engine named by `config`. Failures are
    /// logged and leave the component absent; the service still starts.
    pub fn from_config(config: AppConfig) -> Self {
        let risk_model = load_risk_model(&config);
        let ocr = load_ocr_engine(&config);
        Self::new(config, risk_model, ocr)
    }

    // ── Components ──────────────────────────────────────────

    /// Open a connection to the service database.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.database_path()).map_err(CoreError::Database)
    }

    pub fn risk_model(&self) -> Option<&dyn RiskModel> {
        self.risk_model.as_deref()
    }

    /// Owned handle, for moving into blocking tasks.
    pub fn ocr_engine(&self) -> Option<Arc<dyn OcrEngine>> {
        self.ocr.clone()
    }

    // ── Audit logging ───────────────────────────────────────

    /// Buffer one request outcome; writes the batch once the buffer fills.
    pub fn log_access(&self, source: AccessSource, action: &str, entity: &str) {
        if let Some(batch) = self.audit.record(source, action, entity) {
            if let Err(e) = self.write_audit(&batch) {
                tracing::warn!(lost = batch.len(), "Audit batch not written: {e}");
            }
        }
    }

    /// Entries not yet written to the database.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.pending()
    }

    /// Write everything buffered and drop rows past the retention window.
    pub fn flush_and_prune_audit(&self) -> Result<(), CoreError> {
        let batch = self.audit.take_all();
        self.write_audit(&batch)?;
        let conn = self.open_db()?;
        let pruned = db::repository::prune_audit_log(&conn, AUDIT_RETENTION_DAYS)?;
        if pruned > 0 {
            tracing::info!(pruned, "Old audit rows removed");
        }
        Ok(())
    }

    fn write_audit(&self, batch: &[AuditEntry]) -> Result<(), CoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let records: Vec<AuditRecord> = batch.iter().map(AuditEntry::to_record).collect();
        let conn = self.open_db()?;
        db::repository::insert_audit_records(&conn, &records)?;
        tracing::debug!(count = records.len(), "Audit batch written");
        Ok(())
    }
}

fn load_risk_model(config: &AppConfig) -> Option<Arc<dyn RiskModel>> {
    let path = config.model_path();
    match LogisticRiskModel::load(&path) {
        Ok(model) => {
            tracing::info!(path = %path.display(), "Risk model loaded");
            Some(Arc::new(model))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Risk model not loaded; assessments will be marked as such");
            None
        }
    }
}

#[cfg(feature = "ocr")]
fn load_ocr_engine(config: &AppConfig) -> Option<Arc<dyn OcrEngine>> {
    use crate::pipeline::extraction::ocr::BundledTesseract;

    match BundledTesseract::new(config.tessdata_dir.as_deref()) {
        Ok(engine) => {
            tracing::info!("OCR engine ready");
            Some(Arc::new(engine))
        }
        Err(e) => {
            tracing::warn!(error = %e, "OCR engine failed to initialize; image uploads disabled");
            None
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn load_ocr_engine(_config: &AppConfig) -> Option<Arc<dyn OcrEngine>> {
    tracing::warn!("Built without the `ocr` feature; image uploads disabled");
    None
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Access source tracking
// ═══════════════════════════════════════════════════════════

/// Who made a request, for audit logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessSource {
    /// No valid session presented.
    Anonymous,
    /// Authenticated account.
    User(i64),
}

impl AccessSource {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }
}

impl std::fmt::Display for AccessSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Audit buffer
// ═══════════════════════════════════════════════════════════

/// One served request.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub at: NaiveDateTime,
    pub source: AccessSource,
    pub action: String,
    pub entity: String,
}

impl AuditEntry {
    fn to_record(&self) -> AuditRecord {
        AuditRecord {
            timestamp: self.at,
            source: self.source.to_string(),
            action: self.action.clone(),
            entity: self.entity.clone(),
            user_id: self.source.user_id(),
        }
    }
}

/// Request log kept in memory and handed out in batches of
/// `AUDIT_BUFFER_CAPACITY` for writing.
#[derive(Default)]
pub struct AuditLogger {
    pending: Mutex<Vec<AuditEntry>>,
}

impl AuditLogger {
    /// Append an entry. When that fills the buffer the whole batch is taken
    /// out under the same lock and returned for writing.
    pub fn record(&self, source: AccessSource, action: &str, entity: &str) -> Option<Vec<AuditEntry>> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.push(AuditEntry {
            at: chrono::Utc::now().naive_utc(),
            source,
            action: action.to_string(),
            entity: entity.to_string(),
        });
        (pending.len() >= AUDIT_BUFFER_CAPACITY).then(|| std::mem::take(&mut *pending))
    }

    pub fn pending(&self) -> Vec<AuditEntry> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take_all(&self) -> Vec<AuditEntry> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
