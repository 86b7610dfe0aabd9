use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use super::types::*;

#[utoipa::path(
    get,
    path = "/files/link",
    params(DownloadLinkQuery),
    responses(
        (status = 200, description = "Time-limited download URL", body = DownloadLinkResponse),
        (status = 400, description = "file_id is required"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn get_download_link(
    State(state): State<crate::AppState>,
    query: Result<Query<DownloadLinkQuery>, QueryRejection>,
) -> Result<Json<DownloadLinkResponse>, AppError> {
    let Query(query) = query?;
    let url = state.file_service.download_link(&query.file_id).await?;

    tracing::info!("📎 Generated download URL for file {}", query.file_id);
    Ok(Json(DownloadLinkResponse { url }))
}
