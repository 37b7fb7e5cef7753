use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;

/// One row of the `audit_log` table.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub timestamp: NaiveDateTime,
    /// `anonymous` or `user:<id>`.
    pub source: String,
    /// `<METHOD> <path>`.
    pub action: String,
    /// `status:<code>`.
    pub entity: String,
    pub user_id: Option<i64>,
}

/// Write a batch of records in one transaction.
pub fn insert_audit_records(conn: &Connection, records: &[AuditRecord]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO audit_log (timestamp, source, action, entity, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for r in records {
            stmt.execute(params![
                format_timestamp(&r.timestamp),
                r.source,
                r.action,
                r.entity,
                r.user_id,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Delete records older than `retention_days`.
pub fn prune_audit_log(conn: &Connection, retention_days: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM audit_log WHERE timestamp < datetime('now', ?1)",
        params![format!("-{retention_days} days")],
    )?;
    Ok(deleted)
}

/// Records for one user from the last `days` days, newest first.
pub fn audit_records_for_user(
    conn: &Connection,
    user_id: i64,
    days: i64,
) -> Result<Vec<AuditRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, source, action, entity, user_id FROM audit_log
         WHERE user_id = ?1 AND timestamp >= datetime('now', ?2)
         ORDER BY timestamp DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![user_id, format!("-{days} days")], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<i64>>(4)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (timestamp, source, action, entity, user_id) = row?;
        records.push(AuditRecord {
            timestamp: parse_timestamp("timestamp", &timestamp)?,
            source,
            action,
            entity,
            user_id,
        });
    }
    Ok(records)
}
