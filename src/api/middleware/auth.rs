//! Session authentication middleware.
//!
//! Extracts the session token from `Authorization: Bearer <token>` or the
//! session cookie, resolves it to a live session and injects `CurrentUser`
//! into request extensions for downstream handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::accounts;
use crate::api::middleware::audit::AuditUser;
use crate::api::error::ApiError;
use crate::api::types::{session_token, ApiContext, CurrentUser};
use crate::core_state::CoreError;

/// Require a valid, unexpired session.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = session_token(req.headers()).ok_or(ApiError::Unauthorized)?;

    let current = ctx
        .blocking(move |core| {
            let conn = core.open_db()?;
            let now = chrono::Utc::now().naive_utc();
            accounts::resolve_session(&conn, &token, now).map_err(CoreError::from)
        })
        .await?;

    let (user, token_hash) = current.ok_or(ApiError::Unauthorized)?;
    let audit_user = AuditUser(user.id);
    req.extensions_mut().insert(CurrentUser { user, token_hash });

    let mut response = next.run(req).await;
    response.extensions_mut().insert(audit_user);
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}

/// Resolve the caller's session without requiring one.
/// Used by signup and login to redirect users who are already signed in.
pub async fn optional_user(
    ctx: &ApiContext,
    headers: &axum::http::HeaderMap,
) -> Result<Option<CurrentUser>, ApiError> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };
    let current = ctx
        .blocking(move |core| {
            let conn = core.open_db()?;
            let now = chrono::Utc::now().naive_utc();
            accounts::resolve_session(&conn, &token, now).map_err(CoreError::from)
        })
        .await?;
    Ok(current.map(|(user, token_hash)| CurrentUser { user, token_hash }))
}
