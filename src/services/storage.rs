use crate::api::error::{AppError, AppResult};
use crate::models::META_FILENAME;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::BoxStream;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::io::ReaderStream;

/// Generic key/value metadata stored next to a blob.
pub type ObjectMetadata = HashMap<String, String>;

/// Content of a blob as it arrives from the backend.
pub type BlobStream = BoxStream<'static, AppResult<Bytes>>;

#[derive(Debug, Clone, Default)]
pub struct ObjectStat {
    pub metadata: ObjectMetadata,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One item of a listing. The backend may report an error for an item
/// without ending the listing.
#[derive(Debug, Clone)]
pub enum ListedObject {
    Object(ObjectSummary),
    Skipped { reason: String },
}

/// Object storage the gateway keeps its blobs in. The container (bucket) is
/// bound when the store is built.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        payload: Bytes,
        metadata: ObjectMetadata,
    ) -> AppResult<()>;

    /// Fails with `NotFound` if the key is absent.
    async fn get(&self, key: &str) -> AppResult<BlobStream>;

    /// Fails with `NotFound` if the key is absent.
    async fn stat(&self, key: &str) -> AppResult<ObjectStat>;

    /// Lazy, single pass listing of every key in the container.
    fn list(&self) -> BoxStream<'static, ListedObject>;

    async fn presign(&self, key: &str, ttl: Duration) -> AppResult<String>;
}

/// Reads a whole blob into memory.
pub async fn read_all(mut stream: BlobStream) -> AppResult<Bytes> {
    let mut buf = bytes::BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn to_chrono(d: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(d.secs(), d.subsec_nanos()).unwrap_or_default()
}

/// S3 user metadata travels as HTTP headers, so the free-form filename is
/// percent-encoded on the way in and decoded on the way out.
fn encode_metadata(mut metadata: ObjectMetadata) -> ObjectMetadata {
    if let Some(name) = metadata.get_mut(META_FILENAME) {
        *name = utf8_percent_encode(name, NON_ALPHANUMERIC).to_string();
    }
    metadata
}

fn decode_metadata(mut metadata: ObjectMetadata) -> ObjectMetadata {
    if let Some(name) = metadata.get_mut(META_FILENAME) {
        *name = percent_decode_str(name).decode_utf8_lossy().into_owned();
    }
    metadata
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        payload: Bytes,
        metadata: ObjectMetadata,
    ) -> AppResult<()> {
        let size = payload.len() as i64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size)
            .set_metadata(Some(encode_metadata(metadata)))
            .body(ByteStream::from(payload))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed: key={}, error={:?}", key, e);
                AppError::storage(e)
            })?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<BlobStream> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(Some(service_error.into()))
                } else {
                    AppError::storage(service_error)
                }
            })?;

        let stream =
            ReaderStream::new(res.body.into_async_read()).map(|r| r.map_err(AppError::storage));
        Ok(Box::pin(stream))
    }

    async fn stat(&self, key: &str) -> AppResult<ObjectStat> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    AppError::NotFound(Some(service_error.into()))
                } else {
                    AppError::storage(service_error)
                }
            })?;

        Ok(ObjectStat {
            metadata: decode_metadata(res.metadata.unwrap_or_default()),
            last_modified: res.last_modified.as_ref().map(to_chrono),
            size: res.content_length.unwrap_or(0).max(0) as u64,
        })
    }

    fn list(&self) -> BoxStream<'static, ListedObject> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();

        Box::pin(async_stream::stream! {
            let mut continuation_token = None;
            loop {
                let res = match client
                    .list_objects_v2()
                    .bucket(&bucket)
                    .set_continuation_token(continuation_token)
                    .send()
                    .await
                {
                    Ok(res) => res,
                    Err(e) => {
                        yield ListedObject::Skipped {
                            reason: format!("list_objects_v2 failed: {}", e),
                        };
                        break;
                    }
                };

                for object in res.contents.unwrap_or_default() {
                    match object.key {
                        Some(key) => {
                            yield ListedObject::Object(ObjectSummary {
                                key,
                                size: object.size.unwrap_or(0).max(0) as u64,
                                last_modified: object.last_modified.as_ref().map(to_chrono),
                            });
                        }
                        None => {
                            yield ListedObject::Skipped {
                                reason: "object without key".to_string(),
                            };
                        }
                    }
                }

                if res.is_truncated.unwrap_or(false) {
                    continuation_token = res.next_continuation_token;
                } else {
                    break;
                }
            }
        })
    }

    async fn presign(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(AppError::storage)?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::NotFound(Some(service_error.into()))
                } else {
                    AppError::storage(service_error)
                }
            })?;
        Ok(request.uri().to_string())
    }
}
