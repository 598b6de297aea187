//! Common test utilities for HTTP testing with a mock engine.
//!
//! This module provides a test fixture that creates an in-process router
//! whose workflows run against `MockEngine`s, so the whole HTTP surface can
//! be exercised without FFmpeg installed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use mediaconv_core::{testing::MockEngine, Config, ImageToVideo, VideoToAudio};
use mediaconv_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use mediaconv_core::testing::fixtures;

const BOUNDARY: &str = "mediaconv-test-boundary";

/// Test fixture for HTTP testing with mock engines.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_convert() {
///     let fixture = TestFixture::new();
///
///     fixture.upload("video-to-audio", "video", "clip.mp4", b"...").await;
///     let response = fixture.post("/api/v1/workflows/video-to-audio/convert").await;
///
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Engine behind the image-to-video workflow
    pub image_engine: MockEngine,
    /// Engine behind the video-to-audio workflow
    pub video_engine: MockEngine,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    pub body: Value,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a new test fixture with default config.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(config: Config) -> Self {
        let image_engine = MockEngine::new();
        let video_engine = MockEngine::new();

        let state = Arc::new(AppState::new(
            config,
            ImageToVideo::new(Arc::new(image_engine.clone())),
            VideoToAudio::new(Arc::new(video_engine.clone())),
        ));

        Self {
            router: create_router(state),
            image_engine,
            video_engine,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(path), Body::empty())
            .await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.send(Request::builder().method("POST").uri(path), Body::empty())
            .await
    }

    /// Upload a file to a workflow slot as the `file` field of a multipart form.
    pub async fn upload(
        &self,
        workflow: &str,
        slot: &str,
        filename: &str,
        data: &[u8],
    ) -> TestResponse {
        let body = multipart_body("file", filename, data);
        self.put_multipart(&format!("/api/v1/workflows/{}/inputs/{}", workflow, slot), body)
            .await
    }

    /// Send a PUT request with a raw multipart body.
    pub async fn put_multipart(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let builder = Request::builder().method("PUT").uri(path).header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        self.send(builder, Body::from(body)).await
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Body) -> TestResponse {
        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Builds a multipart form with a single file field.
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
