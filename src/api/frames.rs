//! Reads a `multipart/form-data` body as a sequence of transfer frames.
//!
//! Each part is one frame, in order. The part named after the call's
//! metadata field (`filename` or `file_id`) is a metadata frame; parts named
//! `chunk` carry payload bytes.

use crate::api::error::{AppError, AppResult};
use crate::services::transfer::{Frame, TransferKind};
use axum::extract::Multipart;
use futures::Stream;

pub const CHUNK_FIELD: &str = "chunk";

pub fn multipart_frames(
    mut multipart: Multipart,
    kind: TransferKind,
) -> impl Stream<Item = AppResult<Frame>> {
    async_stream::try_stream! {
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::warn!("Failed to read multipart field: {}", e);
            AppError::internal(e)
        })? {
            let name = field.name().unwrap_or_default().to_string();

            if name == kind.metadata_field() {
                let value = field.text().await.map_err(AppError::internal)?;
                yield Frame::Metadata(value);
            } else if name == CHUNK_FIELD {
                let data = field.bytes().await.map_err(AppError::internal)?;
                yield Frame::Chunk(data);
            } else {
                Err::<(), _>(AppError::invalid_argument(format!(
                    "unexpected field '{}', expected '{}' or '{}'",
                    name,
                    kind.metadata_field(),
                    CHUNK_FIELD
                )))?;
            }
        }
    }
}
