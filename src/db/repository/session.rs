use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::Session;

pub fn insert_session(conn: &Connection, session: &Session) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            session.token_hash,
            session.user_id,
            format_timestamp(&session.created_at),
            format_timestamp(&session.expires_at),
        ],
    )?;
    Ok(())
}

/// Look up a session that is still valid at `now`.
pub fn get_live_session(
    conn: &Connection,
    token_hash: &str,
    now: &NaiveDateTime,
) -> Result<Option<Session>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
            params![token_hash, format_timestamp(now)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(token_hash, user_id, created_at, expires_at)| {
        Ok(Session {
            token_hash,
            user_id,
            created_at: parse_timestamp("created_at", &created_at)?,
            expires_at: parse_timestamp("expires_at", &expires_at)?,
        })
    })
    .transpose()
}

/// Returns whether a session was removed.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(deleted > 0)
}

pub fn prune_expired_sessions(
    conn: &Connection,
    now: &NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![format_timestamp(now)],
    )?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_support;

    fn session(user_id: i64, hash: &str, ttl: Duration) -> Session {
        let now = Utc::now().naive_utc();
        Session {
            token_hash: hash.into(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    #[test]
    fn live_session_is_found() {
        let conn = open_memory_database().unwrap();
        let user_id = test_support::user(&conn, "s@example.com");
        insert_session(&conn, &session(user_id, "abc", Duration::days(1))).unwrap();

        let found = get_live_session(&conn, "abc", &Utc::now().naive_utc())
            .unwrap()
            .unwrap();
        assert_eq!(found.user_id, user_id);
    }

    #[test]
    fn expired_session_is_ignored_and_pruned() {
        let conn = open_memory_database().unwrap();
        let user_id = test_support::user(&conn, "old@example.com");
        insert_session(&conn, &session(user_id, "stale", Duration::days(-1))).unwrap();
        insert_session(&conn, &session(user_id, "fresh", Duration::days(1))).unwrap();

        let now = Utc::now().naive_utc();
        assert!(get_live_session(&conn, "stale", &now).unwrap().is_none());
        assert_eq!(prune_expired_sessions(&conn, &now).unwrap(), 1);
        assert!(get_live_session(&conn, "fresh", &now).unwrap().is_some());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let conn = open_memory_database().unwrap();
        let user_id = test_support::user(&conn, "d@example.com");
        insert_session(&conn, &session(user_id, "gone", Duration::days(1))).unwrap();
        assert!(delete_session(&conn, "gone").unwrap());
        assert!(!delete_session(&conn, "gone").unwrap());
    }
}
