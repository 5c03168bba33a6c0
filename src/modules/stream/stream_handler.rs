use axum::{
    body::Body,
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
};
use std::path::Path as FsPath;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::common::ids::JobId;
use crate::common::response::ApiError;
use crate::state::AppState;

/// Content type for a streaming artifact, by extension.
pub fn content_type_for(path: &FsPath) -> mime::Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let known = match ext.as_deref() {
        Some("m3u8") => Some("application/vnd.apple.mpegurl"),
        Some("mpd") => Some("application/dash+xml"),
        Some("ts") => Some("video/mp2t"),
        Some("m4s") => Some("video/iso.segment"),
        _ => None,
    };

    known
        .and_then(|m| m.parse().ok())
        .unwrap_or_else(|| mime_guess::from_path(path).first_or_octet_stream())
}

/// Serve a manifest or segment from a job's output tree
///
/// Range requests, conditional requests and 404 for missing files are
/// handled by `ServeFile`.
#[utoipa::path(
    get,
    path = "/stream/{id}/{format}/{file}",
    params(
        ("id" = String, Path, description = "Job ID"),
        ("format" = String, Path, description = "Output format: hls or dash"),
        ("file" = String, Path, description = "Manifest or segment file name")
    ),
    responses(
        (status = 200, description = "Stream Content"),
        (status = 206, description = "Partial Content"),
        (status = 404, description = "Not Found")
    ),
    tag = "Streams"
)]
pub async fn stream_file(
    State(state): State<AppState>,
    Path((id, format, file)): Path<(String, String, String)>,
    req: Request,
) -> Response {
    let Some(path) = state.layout.resolve_artifact(&JobId::new(id), &format, &file) else {
        return ApiError::not_found("Not found").into_response();
    };

    let content_type = content_type_for(&path);
    match ServeFile::new_with_mime(&path, &content_type).oneshot(req).await {
        Ok(res) => res.map(Body::new).into_response(),
        Err(e) => ApiError::internal(format!("Failed to serve {}: {}", path.display(), e)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_content_types() {
        assert_eq!(content_type_for(FsPath::new("playlist.m3u8")).as_ref(), "application/vnd.apple.mpegurl");
        assert_eq!(content_type_for(FsPath::new("manifest.mpd")).as_ref(), "application/dash+xml");
        assert_eq!(content_type_for(FsPath::new("playlist0.ts")).as_ref(), "video/mp2t");
        assert_eq!(content_type_for(FsPath::new("chunk-0-00001.m4s")).as_ref(), "video/iso.segment");
        assert_eq!(content_type_for(FsPath::new("blob")).as_ref(), "application/octet-stream");
    }
}
