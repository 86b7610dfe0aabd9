//! Builds a zip archive out of several stored blobs and re-streams it in
//! fixed-size frames.

use crate::api::error::{AppError, AppResult};
use crate::models::META_FILENAME;
use crate::services::storage::{BlobStore, read_all};
use bytes::Bytes;
use futures::Stream;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::FileOptions;

/// Size of each frame the finished archive is sent in.
pub const ARCHIVE_FRAME_SIZE: usize = 1024 * 1024;

/// Entry name for a blob: its recorded filename, or the identifier when no
/// usable filename was recorded.
pub fn entry_name<'a>(file_id: &'a str, filename: Option<&'a str>) -> &'a str {
    match filename {
        Some(name) if !name.trim().is_empty() => name,
        _ => file_id,
    }
}

/// Counts of what went into an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub requested: usize,
    pub written: usize,
    pub skipped: usize,
}

pub struct ArchiveAggregator<'a> {
    storage: &'a dyn BlobStore,
}

impl<'a> ArchiveAggregator<'a> {
    pub fn new(storage: &'a dyn BlobStore) -> Self {
        Self { storage }
    }

    /// Fetches every identifier in order and writes it into a zip container.
    ///
    /// An identifier whose content or metadata cannot be fetched is left out
    /// of the archive; only failing to finalize the container fails the call.
    pub async fn build(&self, file_ids: &[String]) -> AppResult<(Bytes, ArchiveSummary)> {
        if file_ids.is_empty() {
            return Err(AppError::invalid_argument(
                "at least one file_id is required",
            ));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let mut summary = ArchiveSummary {
            requested: file_ids.len(),
            ..Default::default()
        };

        for file_id in file_ids {
            // The whole blob is read before its entry is opened, so a broken
            // stream never leaves a truncated entry behind.
            let content = match self.fetch(file_id).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping {} in archive: {:?}", file_id, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let stat = match self.storage.stat(file_id).await {
                Ok(stat) => stat,
                Err(e) => {
                    tracing::warn!("Skipping {} in archive, stat failed: {:?}", file_id, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let name = entry_name(
                file_id,
                stat.metadata.get(META_FILENAME).map(String::as_str),
            );

            if let Err(e) = zip.start_file(name, options) {
                tracing::warn!("Failed to create zip entry for {}: {}", file_id, e);
                summary.skipped += 1;
                continue;
            }
            if let Err(e) = zip.write_all(&content) {
                tracing::warn!("Failed to write zip entry for {}: {}", file_id, e);
                summary.skipped += 1;
                continue;
            }
            summary.written += 1;
        }

        let cursor = zip.finish().map_err(|e| {
            tracing::error!("Failed to finalize zip archive: {}", e);
            AppError::internal(e)
        })?;

        Ok((Bytes::from(cursor.into_inner()), summary))
    }

    async fn fetch(&self, file_id: &str) -> AppResult<Bytes> {
        let stream = self.storage.get(file_id).await?;
        read_all(stream).await
    }
}

/// Splits a finished archive into consecutive frames of at most
/// [`ARCHIVE_FRAME_SIZE`] bytes. The frames share the archive's buffer.
pub fn archive_frames(archive: Bytes) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
    let frames: Vec<Result<Bytes, std::io::Error>> = (0..archive.len())
        .step_by(ARCHIVE_FRAME_SIZE)
        .map(|start| {
            let end = (start + ARCHIVE_FRAME_SIZE).min(archive.len());
            Ok(archive.slice(start..end))
        })
        .collect();
    futures::stream::iter(frames)
}
