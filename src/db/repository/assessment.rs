use std::collections::BTreeMap;
use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::{Assessment, NewAssessment, RiskText};

const ASSESSMENT_COLUMNS: &str =
    "id, date, risk_level, risk_text, confidence_score, inputs, document_name, user_id";

/// Store an assessment; inputs are kept verbatim as a JSON object.
pub fn insert_assessment(conn: &Connection, a: &NewAssessment) -> Result<i64, DatabaseError> {
    let inputs = serde_json::to_string(&a.inputs)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("inputs not serializable: {e}")))?;
    conn.execute(
        "INSERT INTO assessments (date, risk_level, risk_text, confidence_score, inputs,
         document_name, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            format_timestamp(&a.date),
            a.risk_level,
            a.risk_text.as_str(),
            a.confidence_score,
            inputs,
            a.document_name,
            a.user_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_assessment(conn: &Connection, id: i64) -> Result<Option<Assessment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE id = ?1"),
            params![id],
            assessment_row_from_rusqlite,
        )
        .optional()?;
    row.map(assessment_from_row).transpose()
}

/// All assessments of a user, newest first.
pub fn list_assessments_for_user(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<Assessment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ASSESSMENT_COLUMNS} FROM assessments
         WHERE user_id = ?1 ORDER BY date DESC, id DESC"
    ))?;

    let rows = stmt.query_map(params![user_id], assessment_row_from_rusqlite)?;

    let mut assessments = Vec::new();
    for row in rows {
        assessments.push(assessment_from_row(row?)?);
    }
    Ok(assessments)
}

struct AssessmentRow {
    id: i64,
    date: String,
    risk_level: i64,
    risk_text: String,
    confidence_score: f64,
    inputs: String,
    document_name: Option<String>,
    user_id: i64,
}

fn assessment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssessmentRow> {
    Ok(AssessmentRow {
        id: row.get(0)?,
        date: row.get(1)?,
        risk_level: row.get(2)?,
        risk_text: row.get(3)?,
        confidence_score: row.get(4)?,
        inputs: row.get(5)?,
        document_name: row.get(6)?,
        user_id: row.get(7)?,
    })
}

fn assessment_from_row(row: AssessmentRow) -> Result<Assessment, DatabaseError> {
    let inputs: BTreeMap<String, String> =
        serde_json::from_str(&row.inputs).map_err(|_| DatabaseError::InvalidValue {
            field: "inputs".into(),
            value: row.inputs.clone(),
        })?;

    Ok(Assessment {
        id: row.id,
        date: parse_timestamp("date", &row.date)?,
        risk_level: row.risk_level,
        risk_text: RiskText::from_str(&row.risk_text)?,
        confidence_score: row.confidence_score,
        inputs,
        document_name: row.document_name,
        user_id: row.user_id,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_support;

    fn new_assessment(user_id: i64, day: u32, risk_level: i64) -> NewAssessment {
        NewAssessment {
            date: NaiveDate::from_ymd_opt(2026, 5, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            risk_level,
            risk_text: RiskText::from_level(risk_level),
            confidence_score: 81.5,
            inputs: BTreeMap::from([
                ("age".to_string(), "52".to_string()),
                ("sysBP".to_string(), "150".to_string()),
            ]),
            document_name: None,
            user_id,
        }
    }

    #[test]
    fn insert_and_get_preserves_inputs() {
        let conn = open_memory_database().unwrap();
        let user_id = test_support::user(&conn, "a@example.com");
        let id = insert_assessment(&conn, &new_assessment(user_id, 3, 62)).unwrap();

        let stored = get_assessment(&conn, id).unwrap().unwrap();
        assert_eq!(stored.user_id, user_id);
        assert_eq!(stored.risk_text, RiskText::High);
        assert_eq!(stored.inputs["sysBP"], "150");
        assert!((stored.confidence_score - 81.5).abs() < f64::EPSILON);
    }

    #[test]
    fn list_is_newest_first_and_scoped_to_user() {
        let conn = open_memory_database().unwrap();
        let alice = test_support::user(&conn, "alice@example.com");
        let bob = test_support::user(&conn, "bob@example.com");
        insert_assessment(&conn, &new_assessment(alice, 1, 10)).unwrap();
        insert_assessment(&conn, &new_assessment(alice, 9, 30)).unwrap();
        insert_assessment(&conn, &new_assessment(alice, 4, 20)).unwrap();
        insert_assessment(&conn, &new_assessment(bob, 5, 90)).unwrap();

        let listed = list_assessments_for_user(&conn, alice).unwrap();
        let levels: Vec<i64> = listed.iter().map(|a| a.risk_level).collect();
        assert_eq!(levels, vec![30, 20, 10]);
        assert!(listed.windows(2).all(|w| w[0].date - w[1].date >= Duration::zero()));
    }

    #[test]
    fn missing_assessment_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_assessment(&conn, 99).unwrap().is_none());
    }

    #[test]
    fn corrupt_inputs_column_is_invalid_value() {
        let conn = open_memory_database().unwrap();
        let user_id = test_support::user(&conn, "c@example.com");
        let id = insert_assessment(&conn, &new_assessment(user_id, 2, 5)).unwrap();
        conn.execute("UPDATE assessments SET inputs = 'not json' WHERE id = ?1", params![id])
            .unwrap();
        let err = get_assessment(&conn, id).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidValue { .. }));
    }
}
