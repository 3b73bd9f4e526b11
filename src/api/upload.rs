//! Upload proxy: stage a multipart file on disk, forward it to the media
//! host, return the public URL.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::AppState;

use super::error::ApiError;

/// Name of the multipart field carrying the file
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Stream the `file` field into a new temp file. `Ok(None)` when the form
/// has no such field.
async fn stage_file(
    multipart: &mut Multipart,
    state: &AppState,
) -> Result<Option<(NamedTempFile, String)>, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read upload: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or("upload")
            .to_string();

        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .tempfile_in(&state.config.media.temp_dir)
            .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;
        let std_file = temp
            .reopen()
            .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;
        let mut file = tokio::fs::File::from_std(std_file);

        let mut written: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to read upload: {}", e)))?
        {
            written += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to stage upload: {}", e)))?;

        tracing::debug!(filename = %filename, bytes = written, "Upload staged");
        return Ok(Some((temp, filename)));
    }

    Ok(None)
}

/// Remove a staged file, logging instead of failing the request.
fn discard(temp: NamedTempFile) {
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        tracing::warn!(path = %path.display(), "Failed to remove staged upload: {}", e);
    }
}

/// Proxy a file to the media host
///
/// POST /api/upload (multipart, field `file`)
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::internal(format!("Failed to parse upload: {}", e)))?;

    let (temp, filename) = stage_file(&mut multipart, &state)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    if !state.media.is_configured() {
        discard(temp);
        return Err(ApiError::internal("Media host is not configured"));
    }

    let result = state.media.upload(temp.path(), &filename).await;
    discard(temp);

    let url = result?;

    tracing::info!(filename = %filename, url = %url, "File uploaded");
    Ok(Json(UploadResponse { url }))
}

/// Any method other than POST on the upload route
pub async fn upload_method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}
