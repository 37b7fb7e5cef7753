//! Dashboard endpoint.

use axum::extract::State;
use axum::Extension;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::core_state::CoreError;
use crate::dashboard::{load_dashboard, DashboardData};

/// `GET /api/dashboard` — history, monthly count and chart for the caller.
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<DashboardData>, ApiError> {
    let user_id = current.id();
    let data = ctx
        .blocking(move |core| {
            let conn = core.open_db()?;
            load_dashboard(&conn, user_id, chrono::Utc::now().naive_utc()).map_err(CoreError::from)
        })
        .await?;
    Ok(Json(data))
}
