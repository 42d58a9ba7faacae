use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{admin_error, api_error, require_session, ApiError};
use crate::compose::{Notice, UploadedFile};
use crate::files::{UploadTarget, MAX_UPLOAD_BYTES};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(flatten)]
    pub file: UploadedFile,
    pub size: usize,
    pub notice: Notice,
}

#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub notice: Notice,
}

fn parse_target(target: &str) -> Result<UploadTarget, ApiError> {
    serde_json::from_value(serde_json::Value::String(target.to_string())).map_err(|_| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("Unknown upload target '{}'", target),
        )
    })
}

/// Reads the multipart field named `file`.
async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(api_error(StatusCode::BAD_REQUEST, "No file provided")),
            Err(e) => {
                tracing::error!("Multipart error: {}", e);
                return Err(api_error(StatusCode::BAD_REQUEST, "Invalid multipart data"));
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        return match field.bytes().await {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) => {
                tracing::error!("Failed to read upload bytes: {}", e);
                Err(api_error(StatusCode::BAD_REQUEST, "Failed to read file data"))
            }
        };
    }
}

/// POST /api/admin/uploads/{target}?slug=
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target): Path<String>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers).await?;
    let target = parse_target(&target)?;
    let bytes = read_file_field(&mut multipart).await?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "File too large. Maximum size is 5MB.",
        ));
    }

    let (file, notice) = state
        .admin
        .upload(session.capabilities(), target, query.slug.as_deref(), &bytes)
        .await
        .map_err(admin_error)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file,
            size: bytes.len(),
            notice,
        }),
    )
        .into_response())
}

/// DELETE /api/admin/files/{*path}
pub async fn delete_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers).await?;
    let notice = state
        .admin
        .delete_file(session.capabilities(), &path)
        .await
        .map_err(admin_error)?;
    Ok(Json(DeleteFileResponse { notice }).into_response())
}
