//! Shared harness for router-level tests.
//!
//! Builds an [`AppState`] rooted in a temp directory, with deterministic job
//! ids and a scripted encoder standing in for ffmpeg.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use vodstream::app::create_app;
use vodstream::common::ids::SequentialIds;
use vodstream::config::settings::{AppConfig, ProcessingMode};
use vodstream::infrastructure::encoder::{EncodeOutput, Encoder, EncoderError};
use vodstream::infrastructure::storage::StreamFormat;
use vodstream::state::AppState;

pub const BOUNDARY: &str = "X-VODSTREAM-TEST-BOUNDARY";

/// Writes a manifest and one segment per format, except for formats told to fail.
#[derive(Default)]
pub struct FakeEncoder {
    failing: HashSet<StreamFormat>,
    panics: bool,
}

impl FakeEncoder {
    pub fn failing(formats: &[StreamFormat]) -> Self {
        Self {
            failing: formats.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Panics on every call, as a buggy encoder would.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn encode(
        &self,
        format: StreamFormat,
        _input: &Path,
        output_dir: &Path,
    ) -> Result<EncodeOutput, EncoderError> {
        if self.panics {
            panic!("scripted encoder panic for {format}");
        }
        tokio::fs::create_dir_all(output_dir).await.unwrap();
        if self.failing.contains(&format) {
            // Leave a partial segment behind, as a crashed encoder would.
            tokio::fs::write(output_dir.join("partial.tmp"), b"junk").await.unwrap();
            return Err(EncoderError::Spawn {
                tool: "fake-ffmpeg".into(),
                source: std::io::Error::other("scripted failure"),
            });
        }

        let (manifest_body, segment): (&[u8], &str) = match format {
            StreamFormat::Hls => (b"#EXTM3U\n#EXTINF:10.0,\nplaylist0.ts\n#EXT-X-ENDLIST\n", "playlist0.ts"),
            StreamFormat::Dash => (b"<?xml version=\"1.0\"?><MPD/>", "chunk-0-00001.m4s"),
        };
        let manifest = output_dir.join(format.manifest_name());
        tokio::fs::write(&manifest, manifest_body).await.unwrap();
        tokio::fs::write(output_dir.join(segment), vec![7u8; 64]).await.unwrap();

        Ok(EncodeOutput {
            format,
            manifest,
            elapsed: Duration::ZERO,
        })
    }
}

pub struct TestHarness {
    pub dir: TempDir,
    pub state: AppState,
    pub app: Router,
}

impl TestHarness {
    pub async fn new(mode: ProcessingMode, encoder: FakeEncoder) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = AppConfig::with_roots(dir.path().join("uploads"), dir.path().join("streams"));
        config.processing_mode = mode;

        let state = AppState::new(config, Arc::new(encoder), Arc::new(SequentialIds::new("job")));
        state.layout.ensure_roots().await.expect("failed to create roots");
        let app = create_app(state.clone());

        Self { dir, state, app }
    }

    pub async fn sync() -> Self {
        Self::new(ProcessingMode::Sync, FakeEncoder::default()).await
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get_json(&self, uri: &str) -> (u16, serde_json::Value) {
        let res = self.get(uri).await;
        let status = res.status().as_u16();
        (status, body_json(res).await)
    }

    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> (u16, serde_json::Value) {
        let res = self.send(upload_request("file", filename, bytes)).await;
        let status = res.status().as_u16();
        (status, body_json(res).await)
    }
}

pub fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: video/mp4\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    Request::post("/api/v1/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(field, filename, bytes)))
        .unwrap()
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(res).await;
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}
