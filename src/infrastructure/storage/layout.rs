//! On-disk layout of uploaded sources and generated output trees.
//!
//! ```text
//! {upload-root}/{job-id}/{original-name}
//! {output-root}/{job-id}/hls/playlist.m3u8
//! {output-root}/{job-id}/dash/manifest.mpd
//! ```
//!
//! Directory and manifest names are part of the public URL scheme and must
//! not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use utoipa::ToSchema;

use crate::common::ids::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    Hls,
    Dash,
}

impl StreamFormat {
    pub const ALL: [StreamFormat; 2] = [StreamFormat::Hls, StreamFormat::Dash];

    pub fn dir_name(self) -> &'static str {
        match self {
            StreamFormat::Hls => "hls",
            StreamFormat::Dash => "dash",
        }
    }

    pub fn manifest_name(self) -> &'static str {
        match self {
            StreamFormat::Hls => "playlist.m3u8",
            StreamFormat::Dash => "manifest.mpd",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.dir_name() == name)
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    upload_root: PathBuf,
    output_root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(upload_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn source_dir(&self, id: &JobId) -> PathBuf {
        self.upload_root.join(id.as_str())
    }

    pub fn source_path(&self, id: &JobId, original_name: &str) -> PathBuf {
        self.source_dir(id).join(original_name)
    }

    pub fn job_output_dir(&self, id: &JobId) -> PathBuf {
        self.output_root.join(id.as_str())
    }

    pub fn output_dir(&self, id: &JobId, format: StreamFormat) -> PathBuf {
        self.job_output_dir(id).join(format.dir_name())
    }

    pub fn manifest_path(&self, id: &JobId, format: StreamFormat) -> PathBuf {
        self.output_dir(id, format).join(format.manifest_name())
    }

    pub fn manifest_url(&self, id: &JobId, format: StreamFormat) -> String {
        format!("/stream/{}/{}/{}", id, format.dir_name(), format.manifest_name())
    }

    pub fn player_url(&self, id: &JobId) -> String {
        format!("/player/{}", id)
    }

    pub async fn ensure_roots(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_root).await?;
        tokio::fs::create_dir_all(&self.output_root).await
    }

    pub async fn ensure_source_dir(&self, id: &JobId) -> io::Result<()> {
        tokio::fs::create_dir_all(self.source_dir(id)).await
    }

    /// A job becomes visible to the registry once this directory exists.
    pub async fn ensure_job_output_dir(&self, id: &JobId) -> io::Result<()> {
        tokio::fs::create_dir_all(self.job_output_dir(id)).await
    }

    pub async fn ensure_output_dirs(&self, id: &JobId) -> io::Result<()> {
        for format in StreamFormat::ALL {
            tokio::fs::create_dir_all(self.output_dir(id, format)).await?;
        }
        Ok(())
    }

    /// Remove everything stored for a job that never made it past intake.
    pub async fn discard_job(&self, id: &JobId) -> io::Result<()> {
        for dir in [self.source_dir(id), self.job_output_dir(id)] {
            match tokio::fs::remove_dir_all(&dir).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }
        Ok(())
    }

    pub async fn manifest_exists(&self, id: &JobId, format: StreamFormat) -> bool {
        tokio::fs::metadata(self.manifest_path(id, format))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Map a `/stream/{id}/{format}/{file}` request onto the output tree.
    ///
    /// Returns `None` for unknown formats and for any file path that could
    /// escape the format directory.
    pub fn resolve_artifact(&self, id: &JobId, format: &str, file: &str) -> Option<PathBuf> {
        if !id.is_path_safe() {
            return None;
        }
        let format = StreamFormat::from_dir_name(format)?;
        let relative = Path::new(file);
        if file.is_empty() || file.contains('\\') || file.contains('\0') {
            return None;
        }
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.output_dir(id, format).join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ArtifactLayout {
        ArtifactLayout::new("uploads", "streams")
    }

    #[test]
    fn paths_follow_the_published_layout() {
        let layout = layout();
        let id = JobId::new("abc123");
        assert_eq!(layout.source_path(&id, "clip.mp4"), PathBuf::from("uploads/abc123/clip.mp4"));
        assert_eq!(layout.output_dir(&id, StreamFormat::Hls), PathBuf::from("streams/abc123/hls"));
        assert_eq!(
            layout.manifest_path(&id, StreamFormat::Hls),
            PathBuf::from("streams/abc123/hls/playlist.m3u8")
        );
        assert_eq!(
            layout.manifest_path(&id, StreamFormat::Dash),
            PathBuf::from("streams/abc123/dash/manifest.mpd")
        );
    }

    #[test]
    fn format_dirs_are_disjoint() {
        let layout = layout();
        let id = JobId::new("abc123");
        let hls = layout.output_dir(&id, StreamFormat::Hls);
        let dash = layout.output_dir(&id, StreamFormat::Dash);
        assert!(!hls.starts_with(&dash));
        assert!(!dash.starts_with(&hls));
    }

    #[test]
    fn urls() {
        let layout = layout();
        let id = JobId::new("abc123");
        assert_eq!(layout.manifest_url(&id, StreamFormat::Hls), "/stream/abc123/hls/playlist.m3u8");
        assert_eq!(layout.manifest_url(&id, StreamFormat::Dash), "/stream/abc123/dash/manifest.mpd");
        assert_eq!(layout.player_url(&id), "/player/abc123");
    }

    #[test]
    fn resolve_rejects_traversal_and_unknown_formats() {
        let layout = layout();
        let id = JobId::new("abc123");
        assert_eq!(
            layout.resolve_artifact(&id, "dash", "chunk-0-00001.m4s"),
            Some(PathBuf::from("streams/abc123/dash/chunk-0-00001.m4s"))
        );
        assert!(layout.resolve_artifact(&id, "mp4", "x.mp4").is_none());
        assert!(layout.resolve_artifact(&id, "hls", "../dash/manifest.mpd").is_none());
        assert!(layout.resolve_artifact(&id, "hls", "/etc/passwd").is_none());
        assert!(layout.resolve_artifact(&id, "hls", "").is_none());
        assert!(layout.resolve_artifact(&JobId::new(".."), "hls", "playlist.m3u8").is_none());
    }

    #[tokio::test]
    async fn directory_creation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path().join("up"), dir.path().join("out"));
        let id = JobId::new("job");
        layout.ensure_roots().await.unwrap();
        layout.ensure_roots().await.unwrap();
        layout.ensure_job_output_dir(&id).await.unwrap();
        layout.ensure_output_dirs(&id).await.unwrap();
        layout.ensure_output_dirs(&id).await.unwrap();
        assert!(layout.output_dir(&id, StreamFormat::Hls).is_dir());
        assert!(layout.output_dir(&id, StreamFormat::Dash).is_dir());
        assert!(!layout.manifest_exists(&id, StreamFormat::Hls).await);
    }

    #[tokio::test]
    async fn discard_removes_both_job_trees() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path().join("up"), dir.path().join("out"));
        let id = JobId::new("job");
        layout.ensure_roots().await.unwrap();
        layout.ensure_source_dir(&id).await.unwrap();
        tokio::fs::write(layout.source_path(&id, "in.mp4"), b"x").await.unwrap();
        layout.ensure_job_output_dir(&id).await.unwrap();

        layout.discard_job(&id).await.unwrap();
        assert!(!layout.source_dir(&id).exists());
        assert!(!layout.job_output_dir(&id).exists());

        // Nothing left to remove is not an error.
        layout.discard_job(&id).await.unwrap();
        assert!(layout.upload_root().is_dir());
    }
}
