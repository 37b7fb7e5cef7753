use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::enums::RiskText;

/// One risk evaluation, with the exact inputs that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub id: i64,
    /// UTC.
    pub date: NaiveDateTime,
    pub risk_level: i64,
    pub risk_text: RiskText,
    pub confidence_score: f64,
    pub inputs: BTreeMap<String, String>,
    pub document_name: Option<String>,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub date: NaiveDateTime,
    pub risk_level: i64,
    pub risk_text: RiskText,
    pub confidence_score: f64,
    pub inputs: BTreeMap<String, String>,
    pub document_name: Option<String>,
    pub user_id: i64,
}
