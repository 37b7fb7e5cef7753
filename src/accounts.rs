//! Account creation, login sessions and their lookup.
//!
//! Passwords are PBKDF2 hashed. Session tokens are random, handed to the
//! client once, and stored only as their SHA-256.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use thiserror::Error;

use crate::core_state::CoreError;
use crate::crypto::{self, CryptoError};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{NewUser, Session, User};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("An account with that email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<CoreError> for AccountError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => AccountError::Database(e),
        }
    }
}

/// Signup form. Fields are optional because clients may omit them.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SignupForm {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A freshly created login. `token` is the only copy of the secret.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub user: User,
    pub expires_at: NaiveDateTime,
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, AccountError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(AccountError::MissingField(name))
}

/// Create an account with the welcome flag set. Returns the new user id.
pub fn create_account(
    conn: &Connection,
    form: &SignupForm,
    pbkdf2_iterations: u32,
) -> Result<i64, AccountError> {
    let full_name = required(&form.fullname, "fullname")?;
    let email = required(&form.email, "email")?;
    let password = required(&form.password, "password")?;

    let password_hash = crypto::hash_password(password, pbkdf2_iterations)?;
    let id = repository::insert_user(
        conn,
        &NewUser {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash,
        },
    )
    .map_err(|e| match e {
        DatabaseError::ConstraintViolation(_) => AccountError::EmailTaken,
        other => AccountError::Database(other),
    })?;

    tracing::info!(user_id = id, "Account created");
    Ok(id)
}

/// Check credentials and open a session lasting `session_days`.
pub fn login(
    conn: &Connection,
    form: &LoginForm,
    session_days: i64,
    now: NaiveDateTime,
) -> Result<IssuedSession, AccountError> {
    let email = form.email.as_deref().unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();

    let user = repository::get_user_by_email(conn, email)?
        .ok_or(AccountError::InvalidCredentials)?;
    if !crypto::verify_password(password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "Login rejected");
        return Err(AccountError::InvalidCredentials);
    }

    let token = crypto::generate_token();
    let expires_at = now + Duration::days(session_days);
    repository::insert_session(
        conn,
        &Session {
            token_hash: crypto::hash_token(&token),
            user_id: user.id,
            created_at: now,
            expires_at,
        },
    )?;

    tracing::info!(user_id = user.id, "Session opened");
    Ok(IssuedSession {
        token,
        user,
        expires_at,
    })
}

/// The account behind a live session token, with the token's hash.
pub fn resolve_session(
    conn: &Connection,
    token: &str,
    now: NaiveDateTime,
) -> Result<Option<(User, String)>, DatabaseError> {
    let token_hash = crypto::hash_token(token);
    let Some(session) = repository::get_live_session(conn, &token_hash, &now)? else {
        return Ok(None);
    };
    Ok(repository::get_user(conn, session.user_id)?.map(|user| (user, token_hash)))
}

/// End the session for `token`, if it exists.
pub fn logout(conn: &Connection, token: &str) -> Result<bool, DatabaseError> {
    repository::delete_session(conn, &crypto::hash_token(token))
}

pub fn prune_sessions(conn: &Connection, now: NaiveDateTime) -> Result<usize, DatabaseError> {
    let pruned = repository::prune_expired_sessions(conn, &now)?;
    if pruned > 0 {
        tracing::info!(pruned, "Expired sessions removed");
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::open_memory_database;

    const ITERATIONS: u32 = 1_000;

    fn signup(email: &str, password: &str) -> SignupForm {
        SignupForm {
            fullname: Some("Ada Patient".into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn credentials(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn signup_then_login() {
        let conn = open_memory_database().unwrap();
        let id = create_account(&conn, &signup("a@example.com", "s3cret"), ITERATIONS).unwrap();

        let now = Utc::now().naive_utc();
        let issued = login(&conn, &credentials("a@example.com", "s3cret"), 30, now).unwrap();
        assert_eq!(issued.user.id, id);
        assert_eq!(issued.expires_at, now + Duration::days(30));

        let (user, hash) = resolve_session(&conn, &issued.token, now).unwrap().unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(hash, crypto::hash_token(&issued.token));
    }

    #[test]
    fn password_is_not_stored_in_clear() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &signup("b@example.com", "plaintext"), ITERATIONS).unwrap();
        let user = repository::get_user_by_email(&conn, "b@example.com")
            .unwrap()
            .unwrap();
        assert!(user.password_hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(!user.password_hash.contains("plaintext"));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let conn = open_memory_database().unwrap();
        let mut form = signup("c@example.com", "pw");
        form.password = None;
        assert!(matches!(
            create_account(&conn, &form, ITERATIONS),
            Err(AccountError::MissingField("password"))
        ));
        form.password = Some("pw".into());
        form.fullname = Some(String::new());
        assert!(matches!(
            create_account(&conn, &form, ITERATIONS),
            Err(AccountError::MissingField("fullname"))
        ));
    }

    #[test]
    fn duplicate_email_is_taken() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &signup("d@example.com", "pw"), ITERATIONS).unwrap();
        assert!(matches!(
            create_account(&conn, &signup("d@example.com", "other"), ITERATIONS),
            Err(AccountError::EmailTaken)
        ));
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &signup("e@example.com", "right"), ITERATIONS).unwrap();
        let now = Utc::now().naive_utc();

        let wrong = login(&conn, &credentials("e@example.com", "wrong"), 30, now).unwrap_err();
        let unknown = login(&conn, &credentials("x@example.com", "right"), 30, now).unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AccountError::InvalidCredentials));
    }

    #[test]
    fn expired_session_does_not_resolve() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &signup("f@example.com", "pw"), ITERATIONS).unwrap();
        let then = Utc::now().naive_utc() - Duration::days(40);
        let issued = login(&conn, &credentials("f@example.com", "pw"), 30, then).unwrap();

        let now = Utc::now().naive_utc();
        assert!(resolve_session(&conn, &issued.token, now).unwrap().is_none());
        assert_eq!(prune_sessions(&conn, now).unwrap(), 1);
    }

    #[test]
    fn logout_ends_session() {
        let conn = open_memory_database().unwrap();
        create_account(&conn, &signup("g@example.com", "pw"), ITERATIONS).unwrap();
        let now = Utc::now().naive_utc();
        let issued = login(&conn, &credentials("g@example.com", "pw"), 30, now).unwrap();

        assert!(logout(&conn, &issued.token).unwrap());
        assert!(resolve_session(&conn, &issued.token, now).unwrap().is_none());
        assert!(!logout(&conn, &issued.token).unwrap());
    }
}
