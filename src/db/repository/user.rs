use rusqlite::{params, Connection, OptionalExtension};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str =
    "id, full_name, email, password_hash, image_file, show_welcome, created_at";

/// Insert a new account and return its id. The welcome flag starts set.
pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<i64, DatabaseError> {
    let now = format_timestamp(&chrono::Utc::now().naive_utc());
    conn.execute(
        "INSERT INTO users (full_name, email, password_hash, show_welcome, created_at)
         VALUES (?1, ?2, ?3, 1, ?4)",
        params![user.full_name, user.email, user.password_hash, now],
    )
    .map_err(|e| DatabaseError::from_unique(e, "email"))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn update_user_image(conn: &Connection, id: i64, image_file: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET image_file = ?1 WHERE id = ?2",
        params![image_file, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Read and clear the one-shot welcome flag in one statement.
pub fn take_welcome_flag(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET show_welcome = 0 WHERE id = ?1 AND show_welcome = 1",
        params![id],
    )?;
    Ok(changed > 0)
}

struct UserRow {
    id: i64,
    full_name: String,
    email: String,
    password_hash: String,
    image_file: String,
    show_welcome: i32,
    created_at: String,
}

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        image_file: row.get(4)?,
        show_welcome: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.id,
        full_name: row.full_name,
        email: row.email,
        password_hash: row.password_hash,
        image_file: row.image_file,
        show_welcome: row.show_welcome != 0,
        created_at: parse_timestamp("created_at", &row.created_at)?,
    })
}
