//! Recording and reading back risk assessments.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Assessment, NewAssessment};
use crate::risk::{self, Insights, RiskModel};

/// Optional input entry naming the document the values came from.
pub const DOCUMENT_NAME_KEY: &str = "documentName";

/// A stored assessment together with its explanation.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub assessment: Assessment,
    #[serde(flatten)]
    pub insights: Insights,
}

/// Outcome of looking up an assessment on behalf of a user.
#[derive(Debug)]
pub enum Lookup {
    Found(AssessmentResult),
    Missing,
    /// Exists but belongs to someone else.
    NotOwner,
}

/// Evaluate `inputs` and store the result. The inputs are kept exactly as
/// submitted. Returns the new assessment id.
pub fn record_assessment(
    conn: &Connection,
    model: Option<&dyn RiskModel>,
    inputs: BTreeMap<String, String>,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    let outcome = risk::calculate_risk(model, &inputs);
    let document_name = inputs
        .get(DOCUMENT_NAME_KEY)
        .filter(|name| !name.is_empty())
        .cloned();

    let id = repository::insert_assessment(
        conn,
        &NewAssessment {
            date: now,
            risk_level: outcome.risk_level,
            risk_text: outcome.risk_text,
            confidence_score: outcome.confidence_score,
            inputs,
            document_name,
            user_id,
        },
    )?;

    tracing::info!(
        assessment_id = id,
        user_id,
        risk_level = outcome.risk_level,
        risk_text = %outcome.risk_text,
        "Assessment recorded"
    );
    Ok(id)
}

pub fn load_result(conn: &Connection, id: i64, user_id: i64) -> Result<Lookup, DatabaseError> {
    let Some(assessment) = repository::get_assessment(conn, id)? else {
        return Ok(Lookup::Missing);
    };
    if assessment.user_id != user_id {
        tracing::warn!(assessment_id = id, user_id, "Assessment requested by non-owner");
        return Ok(Lookup::NotOwner);
    }
    let insights = risk::explain(assessment.risk_level, &assessment.inputs);
    Ok(Lookup::Found(AssessmentResult {
        assessment,
        insights,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_support;
    use crate::models::RiskText;
    use crate::risk::{FeatureVector, RiskError};

    struct Always(f64);

    impl RiskModel for Always {
        fn predict_proba(&self, _: &FeatureVector) -> Result<[f64; 2], RiskError> {
            Ok([1.0 - self.0, self.0])
        }
    }

    fn inputs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn stores_inputs_verbatim_with_document_name() {
        let conn = open_memory_database().unwrap();
        let user_id = test_support::user(&conn, "r@example.com");
        let submitted = inputs(&[("age", "55"), ("sysBP", "150"), ("documentName", "labs.docx")]);

        let id = record_assessment(
            &conn,
            Some(&Always(0.7)),
            submitted.clone(),
            user_id,
            Utc::now().naive_utc(),
        )
        .unwrap();

        let Lookup::Found(result) = load_result(&conn, id, user_id).unwrap() else {
            panic!("expected assessment");
        };
        assert_eq!(result.assessment.inputs, submitted);
        assert_eq!(result.assessment.document_name.as_deref(), Some("labs.docx"));
        assert_eq!(result.assessment.risk_level, 70);
        assert_eq!(result.assessment.risk_text, RiskText::High);
        assert_eq!(result.insights.risk_factors.len(), 1);
    }

    #[test]
    fn without_model_result_is_marked() {
        let conn = open_memory_database().unwrap();
        let user_id = test_support::user(&conn, "n@example.com");
        let id = record_assessment(&conn, None, inputs(&[]), user_id, Utc::now().naive_utc())
            .unwrap();

        let Lookup::Found(result) = load_result(&conn, id, user_id).unwrap() else {
            panic!("expected assessment");
        };
        assert_eq!(result.assessment.risk_text, RiskText::ModelNotLoaded);
        assert_eq!(result.assessment.document_name, None);
        assert!(result.insights.risk_factors.is_empty());
    }

    #[test]
    fn other_users_assessment_is_not_returned() {
        let conn = open_memory_database().unwrap();
        let owner = test_support::user(&conn, "owner@example.com");
        let other = test_support::user(&conn, "other@example.com");
        let id = record_assessment(&conn, None, inputs(&[]), owner, Utc::now().naive_utc())
            .unwrap();

        assert!(matches!(load_result(&conn, id, other).unwrap(), Lookup::NotOwner));
        assert!(matches!(load_result(&conn, id + 100, owner).unwrap(), Lookup::Missing));
    }
}
