use crate::api::error::AppError;
use axum::{Json, extract::State};

use super::types::*;

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "Every stored file", body = ListFilesResponse),
        (status = 500, description = "Storage failure")
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
) -> Result<Json<ListFilesResponse>, AppError> {
    let files = state.file_service.list_files().await?;

    tracing::info!("📋 Returned {} files", files.len());
    Ok(Json(ListFilesResponse { files }))
}
