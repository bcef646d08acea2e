use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::QueryRejection,
        DefaultBodyLimit, Multipart, Query,
    },
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    data_uri,
    editor::MAX_PHOTO_BYTES,
    errors::{AppError, Result},
    imaging,
    models::ApiResponse,
    AppState,
};

/// Room for the multipart boundaries and part headers around the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

const ALLOWED_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif"];

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// `passport` crops the photo to 3:4 before returning it
    pub crop: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_photo))
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + MULTIPART_OVERHEAD))
}

fn no_file() -> AppError {
    AppError::BadRequest("No file uploaded".to_string())
}

/// Both the MIME subtype and the file extension must be an allowed image type.
fn is_allowed_image(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    let mime_ok = content_type
        .and_then(|ct| ct.strip_prefix("image/"))
        .map(|sub| ALLOWED_TYPES.contains(&sub.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    let ext_ok = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ALLOWED_TYPES.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    mime_ok && ext_ok
}

/// POST /api/upload - multipart field `photo`, answered with a data URI
pub async fn upload_photo(
    params: std::result::Result<Query<UploadParams>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<String>>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let passport = match params.crop.as_deref() {
        None => false,
        Some("passport") => true,
        Some(other) => {
            return Err(AppError::BadRequest(format!("Unknown crop mode: {}", other)));
        }
    };

    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("multipart rejected: {}", e);
        no_file()
    })?;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::debug!("multipart read failed: {}", e);
            no_file()
        })?;
        let Some(field) = field else {
            return Err(no_file());
        };
        if field.name() != Some("photo") {
            continue;
        }

        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| {
            tracing::debug!("photo upload failed: {}", e);
            no_file()
        })?;
        if bytes.is_empty() || bytes.len() > MAX_PHOTO_BYTES {
            return Err(no_file());
        }
        if !is_allowed_image(content_type.as_deref(), file_name.as_deref()) {
            return Err(AppError::BadRequest(
                "Only image files are allowed (jpeg, jpg, png, gif)".to_string(),
            ));
        }

        let uri = if passport {
            let jpeg = tokio::task::spawn_blocking(move || imaging::crop_to_passport(&bytes))
                .await
                .map_err(|e| AppError::Internal(format!("crop task failed: {}", e)))?
                .map_err(|e| {
                    tracing::warn!("photo crop failed: {}", e);
                    AppError::Processing("Failed to process the uploaded image".to_string())
                })?;
            data_uri::encode("image/jpeg", &jpeg)
        } else {
            // Checked by is_allowed_image above.
            let mime = content_type.unwrap_or_default();
            data_uri::encode(&mime, &bytes)
        };

        tracing::info!(
            file_name = file_name.as_deref().unwrap_or(""),
            passport,
            "photo uploaded"
        );
        return Ok(Json(ApiResponse::ok(uri)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_check_requires_mime_and_extension() {
        assert!(is_allowed_image(Some("image/png"), Some("me.png")));
        assert!(is_allowed_image(Some("image/jpeg"), Some("ME.JPG")));
        assert!(is_allowed_image(Some("image/gif"), Some("a.b.gif")));
        assert!(!is_allowed_image(Some("image/png"), Some("me.txt")));
        assert!(!is_allowed_image(Some("text/plain"), Some("me.png")));
        assert!(!is_allowed_image(Some("image/webp"), Some("me.webp")));
        assert!(!is_allowed_image(None, Some("me.png")));
        assert!(!is_allowed_image(Some("image/png"), None));
        assert!(!is_allowed_image(Some("image/png"), Some("png")));
    }
}
