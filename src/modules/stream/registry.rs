use std::io;
use tracing::warn;

use super::dto::VideoEntry;
use crate::common::ids::JobId;
use crate::infrastructure::storage::{ArtifactLayout, StreamFormat};

/// Job listing derived from the output root on every call.
///
/// Nothing is cached: a format's URL is published only while its manifest
/// exists on disk.
pub struct JobRegistry;

impl JobRegistry {
    /// Every directory under the output root, in enumeration order.
    ///
    /// Directories without any manifest are listed with null URLs; plain
    /// files are ignored. An unreadable output root is an error.
    pub async fn list(layout: &ArtifactLayout) -> io::Result<Vec<VideoEntry>> {
        let mut entries = tokio::fs::read_dir(layout.output_root()).await?;
        let mut videos = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let id = match entry.file_name().into_string() {
                Ok(name) => JobId::new(name),
                Err(name) => {
                    warn!("Skipping output directory with non UTF-8 name {:?}", name);
                    continue;
                }
            };
            videos.push(Self::derive(layout, id).await);
        }

        Ok(videos)
    }

    /// Derived record for a single job, or `None` if its directory does not exist.
    pub async fn find(layout: &ArtifactLayout, id: &JobId) -> io::Result<Option<VideoEntry>> {
        if !id.is_path_safe() {
            return Ok(None);
        }
        match tokio::fs::metadata(layout.job_output_dir(id)).await {
            Ok(meta) if meta.is_dir() => Ok(Some(Self::derive(layout, id.clone()).await)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn derive(layout: &ArtifactLayout, id: JobId) -> VideoEntry {
        let hls_url = Self::url_if_present(layout, &id, StreamFormat::Hls).await;
        let dash_url = Self::url_if_present(layout, &id, StreamFormat::Dash).await;
        VideoEntry {
            player_url: layout.player_url(&id),
            hls_url,
            dash_url,
            id,
        }
    }

    async fn url_if_present(layout: &ArtifactLayout, id: &JobId, format: StreamFormat) -> Option<String> {
        layout
            .manifest_exists(id, format)
            .await
            .then(|| layout.manifest_url(id, format))
    }
}
