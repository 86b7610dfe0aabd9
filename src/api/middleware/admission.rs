use crate::services::limiter::{
    AdmissionLimiter, OP_DOWNLOAD_ZIP, OP_GET_DOWNLOAD_LINK, OP_LIST_FILES, OP_UPDATE_FILE,
    OP_UPLOAD, classify,
};
use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;

/// Operation name of a routed call.
pub fn operation_name(method: &Method, path: &str) -> &'static str {
    match (method, path) {
        (&Method::POST, "/files") => OP_UPLOAD,
        (&Method::PUT, "/files") => OP_UPDATE_FILE,
        (&Method::GET, "/files") => OP_LIST_FILES,
        (&Method::GET, "/files/link") => OP_GET_DOWNLOAD_LINK,
        (&Method::POST, "/files/archive") => OP_DOWNLOAD_ZIP,
        _ => "Unknown",
    }
}

/// Admits the call through the pool of its operation class.
///
/// The slot is held until the response body has been sent or dropped, so a
/// streamed archive keeps its slot while it is being written and a client
/// that disconnects mid-stream gives it back.
pub async fn admission_middleware(
    State(limiter): State<AdmissionLimiter>,
    req: Request,
    next: Next,
) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let operation = operation_name(req.method(), &path);
    let class = classify(operation);

    tracing::debug!(operation, ?class, "waiting for admission slot");
    let permit = match limiter.acquire(class).await {
        Ok(permit) => permit,
        Err(e) => return e.into_response(),
    };
    tracing::debug!(operation, ?class, "admitted");

    let response = next.run(req).await;

    // The permit rides in the body; `map_err` keeps the body's size hint.
    let (parts, body) = response.into_parts();
    let body = Body::new(body.map_err(move |e| {
        let _held = &permit;
        e
    }));
    Response::from_parts(parts, body)
}
