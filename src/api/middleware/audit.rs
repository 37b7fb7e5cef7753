//! Audit logging middleware.
//!
//! Logs every API request with the caller, method, path and response
//! status. Runs outermost so rejected requests are recorded too; the
//! caller is read from the `AuditUser` marker the auth layer leaves on the
//! response.

use axum::extract::OriginalUri;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::ApiContext;
use crate::core_state::AccessSource;

/// Log API access for audit trail.
/// Accesses `ApiContext` from request extensions.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    // Nested routers see a stripped URI; log the one the client sent
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let ctx = req.extensions().get::<ApiContext>().cloned();

    let response = next.run(req).await;

    let source = response
        .extensions()
        .get::<AuditUser>()
        .map(|u| AccessSource::User(u.0))
        .unwrap_or(AccessSource::Anonymous);

    let status = response.status().as_u16();
    tracing::debug!(%method, %path, status, source = %source, "API request");

    if let Some(ctx) = ctx {
        ctx.core
            .log_access(source, &format!("{method} {path}"), &format!("status:{status}"));
    }

    response
}

/// Marker placed on responses by the auth layer so the audit layer,
/// which runs outside it, knows who was served.
#[derive(Debug, Clone, Copy)]
pub struct AuditUser(pub i64);
