use crate::api::error::{AppError, AppResult};
use crate::models::{
    FileRecord, META_CREATED_AT, META_FILENAME, META_UPDATED_AT, format_timestamp,
    parse_timestamp,
};
use crate::services::archive::{ArchiveAggregator, ArchiveSummary};
use crate::services::storage::{BlobStore, ListedObject, ObjectMetadata};
use crate::utils::naming::{detect_content_type, generate_file_id, with_detected_extension};
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub file_id: String,
    pub size: u64,
}

/// Thin sequential glue between the handlers and the blob store.
pub struct FileService {
    storage: Arc<dyn BlobStore>,
    presign_ttl: Duration,
}

impl FileService {
    pub fn new(storage: Arc<dyn BlobStore>, presign_ttl: Duration) -> Self {
        Self {
            storage,
            presign_ttl,
        }
    }

    /// Stores a new blob and mints its identifier.
    pub async fn upload(&self, filename: String, payload: Bytes) -> AppResult<UploadOutcome> {
        let (content_type, detected_ext) = detect_content_type(&payload);
        let filename = with_detected_extension(&filename, detected_ext);
        let file_id = generate_file_id(&filename);

        let now = format_timestamp(Utc::now());
        let mut metadata = ObjectMetadata::new();
        metadata.insert(META_FILENAME.to_string(), filename.clone());
        metadata.insert(META_CREATED_AT.to_string(), now.clone());
        metadata.insert(META_UPDATED_AT.to_string(), now);

        let size = payload.len() as u64;
        self.storage
            .put(&file_id, content_type, payload, metadata)
            .await?;

        info!("📦 Stored {} as {} ({} bytes, {})", filename, file_id, size, content_type);
        Ok(UploadOutcome {
            file_id,
            filename,
            size,
        })
    }

    /// Replaces the content of an existing blob, keeping its identifier,
    /// filename and creation time.
    ///
    /// Two concurrent updates of the same identifier are not serialized here;
    /// whichever write the backend applies last wins.
    pub async fn update(&self, file_id: &str, payload: Bytes) -> AppResult<UpdateOutcome> {
        let stat = self.storage.stat(file_id).await?;
        let mut metadata = stat.metadata;

        let mut now = Utc::now();
        if let Some(created_at) = metadata.get(META_CREATED_AT).and_then(|v| parse_timestamp(v)) {
            now = now.max(created_at);
        }
        metadata.insert(META_UPDATED_AT.to_string(), format_timestamp(now));

        let (content_type, _) = detect_content_type(&payload);
        let size = payload.len() as u64;
        self.storage
            .put(file_id, content_type, payload, metadata)
            .await?;

        info!("✏️  Updated {} ({} bytes)", file_id, size);
        Ok(UpdateOutcome {
            file_id: file_id.to_string(),
            size,
        })
    }

    pub async fn download_link(&self, file_id: &str) -> AppResult<String> {
        if file_id.trim().is_empty() {
            return Err(AppError::invalid_argument("file_id is required"));
        }

        self.storage.stat(file_id).await?;
        self.storage.presign(file_id, self.presign_ttl).await
    }

    /// Lists every stored blob. Items the backend reports errors for, and
    /// objects that cannot be stat'ed, are skipped.
    pub async fn list_files(&self) -> AppResult<Vec<FileRecord>> {
        let mut listing = self.storage.list();
        let mut files = Vec::new();

        while let Some(item) = listing.next().await {
            let object = match item {
                ListedObject::Object(object) => object,
                ListedObject::Skipped { reason } => {
                    warn!("Skipping listing entry: {}", reason);
                    continue;
                }
            };

            let stat = match self.storage.stat(&object.key).await {
                Ok(stat) => stat,
                Err(e) => {
                    warn!("Failed to stat {}, skipping: {:?}", object.key, e);
                    continue;
                }
            };

            let fallback = stat
                .last_modified
                .or(object.last_modified)
                .unwrap_or_default();
            let timestamp = |key: &str| {
                stat.metadata
                    .get(key)
                    .and_then(|v| parse_timestamp(v))
                    .unwrap_or(fallback)
            };
            let created_at = timestamp(META_CREATED_AT);
            let updated_at = timestamp(META_UPDATED_AT).max(created_at);

            files.push(FileRecord {
                filename: stat.metadata.get(META_FILENAME).cloned().unwrap_or_default(),
                file_id: object.key,
                size: stat.size,
                created_at,
                updated_at,
            });
        }

        Ok(files)
    }

    pub async fn download_archive(&self, file_ids: &[String]) -> AppResult<(Bytes, ArchiveSummary)> {
        let (archive, summary) = ArchiveAggregator::new(self.storage.as_ref())
            .build(file_ids)
            .await?;

        info!(
            "🗜️  Built archive: {} of {} files ({} skipped, {} bytes)",
            summary.written,
            summary.requested,
            summary.skipped,
            archive.len()
        );
        Ok((archive, summary))
    }
}
