//! Assessment endpoints: analyze, result, profile history.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Serialize;
use serde_json::value::RawValue;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::assessments::{load_result, record_assessment, AssessmentResult, Lookup};
use crate::core_state::CoreError;
use crate::db::repository::list_assessments_for_user;
use crate::models::{Assessment, User};

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub id: i64,
    pub redirect: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub assessments: Vec<Assessment>,
}

/// Form values arrive as JSON strings or numbers; both are stored as text,
/// numbers in the digits the client sent.
fn form_values(
    body: BTreeMap<String, Box<RawValue>>,
) -> Result<BTreeMap<String, String>, ApiError> {
    body.into_iter()
        .map(|(key, raw)| {
            let text = raw.get();
            if let Ok(s) = serde_json::from_str::<String>(text) {
                Ok((key, s))
            } else if serde_json::from_str::<serde_json::Number>(text).is_ok() {
                Ok((key, text.to_string()))
            } else {
                Err(ApiError::BadRequest(format!(
                    "Value for {key} must be a string or number"
                )))
            }
        })
        .collect()
}

/// `POST /api/analyze` — evaluate and store an assessment.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<BTreeMap<String, Box<RawValue>>>,
) -> Result<(StatusCode, Json<AnalyzeResponse>), ApiError> {
    let inputs = form_values(body)?;
    let user_id = current.id();

    let id = ctx
        .blocking(move |core| {
            let conn = core.open_db()?;
            let now = chrono::Utc::now().naive_utc();
            record_assessment(&conn, core.risk_model(), inputs, user_id, now)
                .map_err(CoreError::from)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AnalyzeResponse {
            id,
            redirect: format!("/result/{id}"),
        }),
    ))
}

/// `GET /api/result/:id`
pub async fn result(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<AssessmentResult>, ApiError> {
    let user_id = current.id();
    let lookup = ctx
        .blocking(move |core| {
            let conn = core.open_db()?;
            load_result(&conn, id, user_id).map_err(CoreError::from)
        })
        .await?;

    match lookup {
        Lookup::Found(result) => Ok(Json(result)),
        Lookup::Missing => Err(ApiError::NotFound(format!("Assessment {id} not found"))),
        Lookup::NotOwner => Err(ApiError::NotOwner),
    }
}

/// `GET /api/profile` — account details and full history, newest first.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = current.id();
    let assessments = ctx
        .blocking(move |core| {
            let conn = core.open_db()?;
            list_assessments_for_user(&conn, user_id).map_err(CoreError::from)
        })
        .await?;

    Ok(Json(ProfileResponse {
        user: current.user,
        assessments,
    }))
}
