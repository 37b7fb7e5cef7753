//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! JSON routes are nested under `/api/`; profile pictures are served
//! read-only from `/static/profile_pics/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Audit logger → 2. Auth validator (protected only) → 3. Rate limiter

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Multipart framing on top of the file itself.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.core.config.max_upload_bytes + BODY_LIMIT_OVERHEAD;
    let pic_dir = ctx.core.config.profile_pic_dir();

    // Protected routes — require a live session
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Audit → Auth → Rate limit (innermost) → Handler
    //
    // Extension must be outermost so all middleware can access ApiContext.
    // The rate limiter runs inside auth so it can key on the user.
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/dashboard", get(endpoints::dashboard::dashboard))
        .route("/analyze", post(endpoints::assessments::analyze))
        .route("/result/:id", get(endpoints::assessments::result))
        .route("/profile", get(endpoints::assessments::profile))
        .route("/profile/update_pic", post(endpoints::profile::update_pic))
        .route("/ocr-process", post(endpoints::ocr::process))
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes (rate-limited and audited, no auth required)
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/signup", post(endpoints::auth::signup))
        .route("/login", post(endpoints::auth::login))
        .route("/logout", post(endpoints::auth::logout))
        .route("/chat", post(endpoints::chat::send))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .nest_service("/static/profile_pics", ServeDir::new(pic_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}
