#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use blob_gateway::api::error::{AppError, AppResult};
use blob_gateway::config::GatewayConfig;
use blob_gateway::services::storage::{
    BlobStore, BlobStream, ListedObject, ObjectMetadata, ObjectStat, ObjectSummary,
};
use blob_gateway::{AppState, create_app};
use bytes::Bytes;
use chrono::Utc;
use futures::stream::BoxStream;
use http_body_util::BodyExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

#[derive(Clone)]
struct StoredObject {
    content_type: String,
    data: Bytes,
    metadata: ObjectMetadata,
    last_modified: chrono::DateTime<Utc>,
}

/// In-memory stand-in for the object store, with call counting and fault
/// injection.
#[derive(Default)]
pub struct MockBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    failing_gets: Mutex<HashSet<String>>,
    failing_stats: Mutex<HashSet<String>>,
    broken_listing_entries: AtomicUsize,
    pub calls: AtomicUsize,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_get(&self, key: &str) {
        self.failing_gets.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_stat(&self, key: &str) {
        self.failing_stats.lock().unwrap().insert(key.to_string());
    }

    pub fn add_broken_listing_entries(&self, count: usize) {
        self.broken_listing_entries.store(count, Ordering::SeqCst);
    }

    /// Stores an object directly, bypassing the gateway.
    pub fn insert_raw(&self, key: &str, data: &[u8], metadata: ObjectMetadata) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                content_type: "application/octet-stream".to_string(),
                data: Bytes::copy_from_slice(data),
                metadata,
                last_modified: Utc::now(),
            },
        );
    }

    pub fn content(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).map(|o| o.data.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.content_type.clone())
    }

    pub fn metadata(&self, key: &str) -> Option<ObjectMetadata> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.metadata.clone())
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        payload: Bytes,
        metadata: ObjectMetadata,
    ) -> AppResult<()> {
        self.record_call();
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data: payload,
                metadata,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<BlobStream> {
        self.record_call();
        if self.failing_gets.lock().unwrap().contains(key) {
            return Err(AppError::storage(std::io::Error::other("injected get failure")));
        }
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(AppError::not_found)?;

        // Hand the content out in small pieces like a network body would.
        let pieces: Vec<AppResult<Bytes>> = (0..data.len())
            .step_by(4)
            .map(|i| Ok(data.slice(i..(i + 4).min(data.len()))))
            .collect();
        Ok(Box::pin(futures::stream::iter(pieces)))
    }

    async fn stat(&self, key: &str) -> AppResult<ObjectStat> {
        self.record_call();
        if self.failing_stats.lock().unwrap().contains(key) {
            return Err(AppError::storage(std::io::Error::other("injected stat failure")));
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| ObjectStat {
                metadata: o.metadata.clone(),
                last_modified: Some(o.last_modified),
                size: o.data.len() as u64,
            })
            .ok_or_else(AppError::not_found)
    }

    fn list(&self) -> BoxStream<'static, ListedObject> {
        self.record_call();
        let mut items: Vec<ListedObject> = {
            let objects = self.objects.lock().unwrap();
            let mut keys: Vec<&String> = objects.keys().collect();
            keys.sort();
            keys.into_iter()
                .map(|key| {
                    let object = &objects[key];
                    ListedObject::Object(ObjectSummary {
                        key: key.clone(),
                        size: object.data.len() as u64,
                        last_modified: Some(object.last_modified),
                    })
                })
                .collect()
        };
        for i in 0..self.broken_listing_entries.load(Ordering::SeqCst) {
            items.insert(
                i.min(items.len()),
                ListedObject::Skipped {
                    reason: "injected listing error".to_string(),
                },
            );
        }
        Box::pin(futures::stream::iter(items))
    }

    async fn presign(&self, key: &str, ttl: Duration) -> AppResult<String> {
        self.record_call();
        if !self.objects.lock().unwrap().contains_key(key) {
            return Err(AppError::not_found());
        }
        Ok(format!(
            "http://mock-storage/files/{}?X-Amz-Expires={}",
            key,
            ttl.as_secs()
        ))
    }
}

pub fn test_state(store: Arc<MockBlobStore>) -> AppState {
    AppState::new(store, GatewayConfig::development())
}

pub fn test_app(store: Arc<MockBlobStore>) -> axum::Router {
    create_app(test_state(store))
}

pub const BOUNDARY: &str = "---------------------------blobgatewayboundary";

/// One multipart part: `(field name, text content)`.
pub fn multipart_body(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        if *name == "chunk" {
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"blob\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name
                )
                .as_bytes(),
            );
        } else {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(method: &str, parts: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/files")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &axum::Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
