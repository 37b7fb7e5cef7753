//! Account endpoints: signup, login, logout.
//!
//! Login returns the bearer token in the body and also sets it as an
//! `HttpOnly` cookie for browser clients.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::{self, AccountError, LoginForm, SignupForm};
use crate::api::error::ApiError;
use crate::api::middleware::auth::optional_user;
use crate::api::types::{session_token, ApiContext, MessageResponse, SESSION_COOKIE};
use crate::core_state::CoreError;
use crate::models::User;

pub const ACCOUNT_CREATED_MESSAGE: &str = "Account created! You can now log in.";

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::MissingField(field) => {
                ApiError::BadRequest(format!("Missing required field: {field}"))
            }
            AccountError::EmailTaken => ApiError::Conflict(err.to_string()),
            AccountError::InvalidCredentials => ApiError::LoginFailed,
            AccountError::Crypto(e) => ApiError::Internal(e.to_string()),
            AccountError::Database(e) => e.into(),
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: chrono::NaiveDateTime,
    pub user: User,
    pub redirect: &'static str,
}

fn session_cookie(token: &str, max_age_secs: i64) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .map_err(|e| ApiError::Internal(format!("session cookie: {e}")))
}

/// `POST /api/signup`
pub async fn signup(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(form): Json<SignupForm>,
) -> Result<Response, ApiError> {
    if optional_user(&ctx, &headers).await?.is_some() {
        return Ok(Json(MessageResponse::redirect("/dashboard")).into_response());
    }

    ctx.blocking(move |core| {
        let conn = core.open_db()?;
        accounts::create_account(&conn, &form, core.config.pbkdf2_iterations)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::flash(
            ACCOUNT_CREATED_MESSAGE,
            "success",
            "/login",
        )),
    )
        .into_response())
}

/// `POST /api/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(form): Json<LoginForm>,
) -> Result<Response, ApiError> {
    if optional_user(&ctx, &headers).await?.is_some() {
        return Ok(Json(MessageResponse::redirect("/dashboard")).into_response());
    }

    let session_days = ctx.core.config.session_days;
    let issued = ctx
        .blocking(move |core| {
            let conn = core.open_db()?;
            let now = chrono::Utc::now().naive_utc();
            accounts::login(&conn, &form, session_days, now)
        })
        .await?;

    let cookie = session_cookie(&issued.token, session_days * 24 * 60 * 60)?;
    let mut response = Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: issued.user,
        redirect: "/dashboard",
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// `POST /api/logout` — works with or without a session.
pub async fn logout(State(ctx): State<ApiContext>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        let removed = ctx
            .blocking(move |core| {
                let conn = core.open_db()?;
                accounts::logout(&conn, &token).map_err(CoreError::from)
            })
            .await?;
        tracing::info!(removed, "Logout");
    }

    let mut response = Json(MessageResponse::redirect("/")).into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, session_cookie("", 0)?);
    Ok(response)
}
