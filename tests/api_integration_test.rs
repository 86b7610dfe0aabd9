mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_upload_link_update_roundtrip() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(
        &app,
        multipart_request(
            "POST",
            &[("filename", "a.txt"), ("chunk", "hel"), ("chunk", "lo")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let file_id = body["file_id"].as_str().unwrap().to_string();
    assert_eq!(body["filename"], "a.txt");
    assert_eq!(body["size"], 5);
    assert!(file_id.starts_with("a-"));
    assert!(file_id.ends_with(".txt"));
    assert_eq!(store.content(&file_id).unwrap(), "hello");

    let response = send(&app, get_request(&format!("/files/link?file_id={}", file_id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["url"].as_str().unwrap().contains(&file_id));

    let response = send(
        &app,
        multipart_request(
            "PUT",
            &[("file_id", file_id.as_str()), ("chunk", "HELLO!")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["file_id"], file_id.as_str());
    assert_eq!(body["new_size"], 6);
    assert_eq!(store.content(&file_id).unwrap(), "HELLO!");

    let metadata = store.metadata(&file_id).unwrap();
    assert_eq!(metadata.get("filename").map(String::as_str), Some("a.txt"));
}

#[tokio::test]
async fn test_upload_without_leading_metadata_is_rejected() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(
        &app,
        multipart_request("POST", &[("chunk", "hel"), ("filename", "a.txt")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MISSING_REQUIRED_METADATA");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_update_without_id_is_rejected() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(&app, multipart_request("PUT", &[("chunk", "data")])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MISSING_REQUIRED_METADATA");
}

#[tokio::test]
async fn test_repeated_metadata_is_rejected() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(
        &app,
        multipart_request(
            "POST",
            &[("filename", "a.txt"), ("chunk", "x"), ("filename", "b.txt")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "DUPLICATE_METADATA");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_unknown_part_is_rejected() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store);

    let response = send(
        &app,
        multipart_request("POST", &[("filename", "a.txt"), ("blob", "x")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store);

    let response = send(
        &app,
        multipart_request("PUT", &[("file_id", "missing-id.txt"), ("chunk", "x")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "file not found");
}

#[tokio::test]
async fn test_download_link_errors() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store);

    let response = send(&app, get_request("/files/link?file_id=")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");

    let response = send(&app, get_request("/files/link")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, get_request("/files/link?file_id=nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_files_skips_broken_entries() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    for name in ["one.txt", "two.txt"] {
        let response = send(
            &app,
            multipart_request("POST", &[("filename", name), ("chunk", "data")]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    store.add_broken_listing_entries(1);

    let response = send(&app, get_request("/files")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);

    let mut names: Vec<&str> = files
        .iter()
        .map(|f| f["filename"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["one.txt", "two.txt"]);
    for file in files {
        assert_eq!(file["size"], 4);
        assert!(file["created_at"].as_str().unwrap() <= file["updated_at"].as_str().unwrap());
    }
}

#[tokio::test]
async fn test_archive_with_no_ids_is_rejected() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(&app, json_request("POST", "/files/archive", json!({ "file_ids": [] }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_malformed_archive_request_is_invalid_argument() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(
        &app,
        json_request("POST", "/files/archive", json!({ "file_ids": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_ARGUMENT");
    assert!(body["error"].as_str().unwrap().contains("file_ids"));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_upload_that_is_not_multipart_is_invalid_argument() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(
        &app,
        json_request("POST", "/files", json!({ "filename": "a.txt" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");

    let response = send(
        &app,
        json_request("PUT", "/files", json!({ "file_id": "a.txt" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_archive_download_headers_and_content() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store.clone());

    let response = send(
        &app,
        multipart_request("POST", &[("filename", "notes.txt"), ("chunk", "some notes")]),
    )
    .await;
    let file_id = body_json(response).await["file_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        &app,
        json_request(
            "POST",
            "/files/archive",
            json!({ "file_ids": [file_id, "does-not-exist"] }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/zip"
    );
    assert!(
        response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("files.zip")
    );

    let bytes = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(archive.len(), 1);
    let mut entry = archive.by_index(0).unwrap();
    assert_eq!(entry.name(), "notes.txt");
    let mut content = String::new();
    std::io::Read::read_to_string(&mut entry, &mut content).unwrap();
    assert_eq!(content, "some notes");
}

#[tokio::test]
async fn test_health_check() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store);

    let response = send(&app, get_request("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let store = Arc::new(MockBlobStore::new());
    let app = test_app(store);

    let response = send(&app, get_request("/health")).await;
    assert!(response.headers().get("x-request-id").is_some());
}
