use crate::models::FileRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UpdateFileResponse {
    pub file_id: String,
    pub new_size: u64,
}

#[derive(Deserialize, IntoParams)]
pub struct DownloadLinkQuery {
    #[serde(default)]
    pub file_id: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DownloadLinkResponse {
    pub url: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ListFilesResponse {
    pub files: Vec<FileRecord>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct DownloadArchiveRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one file_id is required"))]
    pub file_ids: Vec<String>,
}
