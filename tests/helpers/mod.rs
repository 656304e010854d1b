//! Test helper utilities for API testing

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use doc_intake::app_state::AppState;
use doc_intake::routes;
use doc_intake::services::clock::TokioClock;
use doc_intake::services::driver::IntakeService;
use doc_intake::services::engine::IntakeEngine;
use doc_intake::services::progress::FixedDelta;

pub const MIB: usize = 1024 * 1024;

const BOUNDARY: &str = "doc-intake-test-boundary";
const MAX_REQUEST_BYTES: usize = 64 * MIB;

/// One file part of a multipart upload.
pub struct Part<'a> {
    pub name: &'a str,
    pub content_type: Option<&'a str>,
    pub size: usize,
}

impl<'a> Part<'a> {
    pub fn new(name: &'a str, content_type: &'a str, size: usize) -> Self {
        Self {
            name,
            content_type: Some(content_type),
            size,
        }
    }
}

/// Router backed by a driver on the tokio clock with a fixed 25% increment,
/// so a document completes 3.8s after submission.
pub fn test_app() -> Router {
    let deltas = Box::new(FixedDelta::new(25.0));
    let engine = IntakeEngine::new(Box::new(TokioClock::new()), deltas);
    let state = AppState::new(IntakeService::start(engine));
    routes::api_router(state, MAX_REQUEST_BYTES)
}

/// Build a multipart/form-data upload request.
pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                part.name
            )
            .as_bytes(),
        );
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend(std::iter::repeat(b'x').take(part.size));
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/documents")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

/// Send a request, assert the status and decode the JSON body.
pub async fn send_json<T: DeserializeOwned>(
    app: &Router,
    req: Request<Body>,
    status: StatusCode,
) -> T {
    let resp = send(app, req).await;
    assert_eq!(resp.status(), status);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
