//! Profile picture upload.

use axum::extract::{Multipart, State};
use axum::Extension;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser, MessageResponse};
use crate::profile_pics::{replace_picture, PictureError, PICTURE_UPDATED_MESSAGE};

/// Multipart field carrying the picture.
const PICTURE_FIELD: &str = "profile_pic";

impl From<PictureError> for ApiError {
    fn from(err: PictureError) -> Self {
        match err {
            PictureError::Io(e) => ApiError::Internal(format!("profile picture: {e}")),
            PictureError::Database(e) => e.into(),
        }
    }
}

/// `POST /api/profile/update_pic` — always answers with a redirect to the
/// profile page; the message is only present when a picture was stored.
pub async fn update_pic(
    State(ctx): State<ApiContext>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(PICTURE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let Some((file_name, bytes)) = upload.filter(|(name, _)| !name.is_empty()) else {
        return Ok(Json(MessageResponse::redirect("/profile")));
    };

    let user = current.user;
    ctx.blocking(move |core| {
        let conn = core.open_db()?;
        replace_picture(&conn, &core.config.profile_pic_dir(), &user, &file_name, &bytes)
    })
    .await?;

    Ok(Json(MessageResponse::flash(
        PICTURE_UPDATED_MESSAGE,
        "success",
        "/profile",
    )))
}
