//! Profile picture upload and serving.
//!
//! Files live under `<UPLOAD_DIR>/profile_pictures/` with generated names;
//! the student record stores the public URL path.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Multipart, Path, Request, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::Json;
use hms_core::uploads::{
    image_extension, is_safe_filename, public_path, stored_filename, MAX_PROFILE_PICTURE_BYTES,
};
use hms_db::repositories::StudentRepo;
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::current_student;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStudent;
use crate::state::AppState;

/// Multipart field carrying the image.
const UPLOAD_FIELD: &str = "profile_picture";

/// Browsers may cache a picture for a year; a replacement gets a new name.
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub profile_picture_url: String,
    pub filename: String,
}

/// POST /api/student/upload-profile-picture
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let student = current_student(&state, &user).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        upload = Some((original_name, bytes));
        break;
    }

    let (original_name, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;
    if original_name.is_empty() {
        return Err(AppError::BadRequest("No file selected".into()));
    }
    let extension = image_extension(&original_name).ok_or_else(|| {
        AppError::BadRequest(
            "Invalid file type. Only PNG, JPG, JPEG, and GIF files are allowed.".into(),
        )
    })?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if bytes.len() > MAX_PROFILE_PICTURE_BYTES {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {} MB",
            MAX_PROFILE_PICTURE_BYTES / (1024 * 1024)
        )));
    }

    let dir = state.config.profile_picture_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;

    let filename = stored_filename(&extension);
    tokio::fs::write(dir.join(&filename), &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    let url = public_path(&filename);
    let previous = StudentRepo::set_profile_picture(&state.pool, student.id, &url).await?;

    if let Some(old) = previous.filter(|old| *old != url) {
        remove_previous(&dir, &old).await;
    }

    tracing::info!(
        student_id = student.id,
        filename = %filename,
        size = bytes.len(),
        "Profile picture uploaded",
    );

    Ok(Json(UploadResponse {
        message: "Profile picture uploaded successfully".into(),
        profile_picture_url: url,
        filename,
    }))
}

/// GET /api/uploads/profile_pictures/{file}
///
/// Public so `<img>` tags can load pictures without a token.
pub async fn serve_profile_picture(
    State(state): State<AppState>,
    Path(file): Path<String>,
    request: Request,
) -> AppResult<Response> {
    if !is_safe_filename(&file) {
        return Err(AppError::NotFound("File not found".into()));
    }

    let path = state.config.profile_picture_dir().join(&file);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::warn!(file = %file, "Profile picture not found");
        return Err(AppError::NotFound("File not found".into()));
    }

    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = response.map(Body::new);
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    }
    Ok(response)
}

/// Delete a replaced picture. Failures are logged, not returned.
async fn remove_previous(dir: &FsPath, old_url: &str) {
    let Some(old_name) = old_url.rsplit('/').next().filter(|n| is_safe_filename(n)) else {
        return;
    };
    match tokio::fs::remove_file(dir.join(old_name)).await {
        Ok(()) => tracing::info!(file = %old_name, "Removed replaced profile picture"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(file = %old_name, error = %e, "Could not remove old profile picture")
        }
    }
}
