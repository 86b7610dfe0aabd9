use crate::api::error::AppError;
use crate::services::archive::archive_frames;
use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use validator::Validate;

use super::types::*;

pub const ARCHIVE_FILENAME: &str = "files.zip";

#[utoipa::path(
    post,
    path = "/files/archive",
    request_body = DownloadArchiveRequest,
    responses(
        (status = 200, description = "Zip archive stream (files that could not be fetched are left out)", content_type = "application/zip"),
        (status = 400, description = "Malformed request or no file_id given"),
        (status = 500, description = "Archive could not be finalized")
    ),
    tag = "files"
)]
pub async fn download_archive(
    State(state): State<crate::AppState>,
    req: Result<Json<DownloadArchiveRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = req?;
    req.validate()
        .map_err(|_| AppError::invalid_argument("at least one file_id is required"))?;

    let (archive, _) = state.file_service.download_archive(&req.file_ids).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", ARCHIVE_FILENAME),
            ),
        ],
        Body::from_stream(archive_frames(archive)),
    )
        .into_response())
}
