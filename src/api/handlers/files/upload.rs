use crate::api::error::AppError;
use crate::api::frames::multipart_frames;
use crate::services::transfer::{TransferKind, assemble};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};

use super::types::*;

#[utoipa::path(
    post,
    path = "/files",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Frame sequence: a `filename` part first, then any number of `chunk` parts"
    ),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Filename missing from, or repeated after, the first frame"),
        (status = 500, description = "Storage or transport failure")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let multipart = multipart?;
    let kind = TransferKind::Upload;
    let assembled = assemble(kind, multipart_frames(multipart, kind)).await?;

    let outcome = state
        .file_service
        .upload(assembled.metadata, assembled.payload)
        .await?;

    tracing::info!(
        "📥 Uploaded file: {} ({} bytes) as ID: {}",
        outcome.filename,
        outcome.size,
        outcome.file_id
    );

    Ok(Json(UploadResponse {
        file_id: outcome.file_id,
        filename: outcome.filename,
        size: outcome.size,
    }))
}

#[utoipa::path(
    put,
    path = "/files",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Frame sequence: a `file_id` part first, then any number of `chunk` parts"
    ),
    responses(
        (status = 200, description = "File content replaced", body = UpdateFileResponse),
        (status = 400, description = "file_id missing from, or repeated after, the first frame"),
        (status = 404, description = "File not found"),
        (status = 500, description = "Storage or transport failure")
    ),
    tag = "files"
)]
pub async fn update_file(
    State(state): State<crate::AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UpdateFileResponse>, AppError> {
    let multipart = multipart?;
    let kind = TransferKind::Update;
    let assembled = assemble(kind, multipart_frames(multipart, kind)).await?;

    let outcome = state
        .file_service
        .update(&assembled.metadata, assembled.payload)
        .await?;

    Ok(Json(UpdateFileResponse {
        file_id: outcome.file_id,
        new_size: outcome.size,
    }))
}
