//! Profile picture storage.
//!
//! Pictures live flat in the profile picture directory under a random
//! name. The default picture is shared and never deleted.

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

use crate::core_state::CoreError;
use crate::crypto::random_hex;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{User, DEFAULT_IMAGE_FILE};
use crate::pipeline::import::file_extension;

pub const PICTURE_UPDATED_MESSAGE: &str = "Your profile picture has been updated!";

#[derive(Error, Debug)]
pub enum PictureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<CoreError> for PictureError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => PictureError::Database(e),
        }
    }
}

/// Random file name keeping the upload's extension: 16 hex chars + ext.
pub fn picture_file_name(original: &str) -> String {
    format!("{}{}", random_hex(8), file_extension(original))
}

/// Save `bytes` as the user's new picture and drop the previous one.
/// Returns the stored file name.
pub fn replace_picture(
    conn: &Connection,
    pic_dir: &Path,
    user: &User,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, PictureError> {
    let file_name = picture_file_name(original_name);

    if user.image_file != DEFAULT_IMAGE_FILE {
        let previous = pic_dir.join(&user.image_file);
        if let Err(e) = std::fs::remove_file(&previous) {
            tracing::debug!(error = %e, "Previous profile picture not removed");
        }
    }

    std::fs::create_dir_all(pic_dir)?;
    std::fs::write(pic_dir.join(&file_name), bytes)?;
    repository::update_user_image(conn, user.id, &file_name)?;

    tracing::info!(user_id = user.id, "Profile picture updated");
    Ok(file_name)
}
