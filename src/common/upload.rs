use axum::{
    extract::multipart::{Field, MultipartError},
    http::StatusCode,
};
use bytes::Bytes;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{error, info};

use crate::common::response::ApiError;

pub const ALLOWED_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("No file part")]
    MissingFilePart,

    #[error("No selected file")]
    EmptyFilename,

    #[error("File type not allowed")]
    DisallowedExtension,

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::MissingFilePart
            | IntakeError::EmptyFilename
            | IntakeError::DisallowedExtension => StatusCode::BAD_REQUEST,
            IntakeError::Multipart(e) => e.status(),
            IntakeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IntakeError> for ApiError {
    fn from(e: IntakeError) -> Self {
        ApiError(e.to_string(), e.status_code())
    }
}

/// Lowercased extension if it is on the allow-list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Path separators become spaces, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9._-]` is dropped and leading/trailing `.`/`_` are
/// trimmed. May return an empty string.
pub fn sanitize_filename(filename: &str) -> String {
    let flattened = filename.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Buffered writer for one uploaded file. Removes the partial file on abort.
pub struct FileUploader {
    path: PathBuf,
    writer: BufWriter<tokio::fs::File>,
    written: u64,
}

impl FileUploader {
    pub async fn new(path: PathBuf) -> std::io::Result<Self> {
        let file = tokio::fs::File::create(&path).await?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: Bytes) -> std::io::Result<()> {
        self.writer.write_all(&chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> std::io::Result<u64> {
        self.writer.flush().await?;
        self.writer.get_mut().sync_all().await?;
        Ok(self.written)
    }

    pub async fn abort(self) {
        drop(self.writer);
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            error!("Failed to remove partial upload {}: {}", self.path.display(), e);
        }
    }
}

/// Stream a multipart field to `path`, returning the number of bytes written.
pub async fn stream_to_disk(mut field: Field<'_>, path: &Path) -> Result<u64, IntakeError> {
    let mut uploader = FileUploader::new(path.to_path_buf()).await?;

    while let Some(chunk) = field.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                error!("Stream error: {}", e);
                uploader.abort().await;
                return Err(e.into());
            }
        };

        if let Err(e) = uploader.write_chunk(chunk).await {
            error!("Upload error: {}", e);
            uploader.abort().await;
            return Err(e.into());
        }
    }

    let written = uploader.finish().await?;
    info!("File uploaded: {} ({} bytes)", path.display(), written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list() {
        assert_eq!(allowed_extension("clip.MP4").as_deref(), Some("mp4"));
        assert_eq!(allowed_extension("a.b.webm").as_deref(), Some("webm"));
        assert_eq!(allowed_extension("notes.txt"), None);
        assert_eq!(allowed_extension("mkv"), None);
        assert_eq!(allowed_extension("trailing."), None);
    }

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("My Holiday Video.mp4"), "My_Holiday_Video.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\clip.mov"), "C_Users_me_clip.mov");
        assert_eq!(sanitize_filename("ümlaut-ß.mkv"), "mlaut-.mkv");
        assert_eq!(sanitize_filename(".hidden.mp4"), "hidden.mp4");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[tokio::test]
    async fn uploader_writes_and_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.mp4");

        let mut uploader = FileUploader::new(path.clone()).await.unwrap();
        uploader.write_chunk(Bytes::from_static(b"abc")).await.unwrap();
        uploader.write_chunk(Bytes::from_static(b"def")).await.unwrap();
        assert_eq!(uploader.finish().await.unwrap(), 6);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");

        let partial = dir.path().join("partial.mp4");
        let mut uploader = FileUploader::new(partial.clone()).await.unwrap();
        uploader.write_chunk(Bytes::from_static(b"abc")).await.unwrap();
        uploader.abort().await;
        assert!(!partial.exists());
    }
}
