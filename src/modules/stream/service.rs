use anyhow::{Context, Result};
use axum::extract::Multipart;
use std::path::PathBuf;
use tracing::{info, warn};

use super::dto::{UploadResponse, UploadStatus, VideoEntry, VideoStatusResponse};
use super::events::TranscodeJob;
use super::pipeline::PipelineOutcome;
use super::registry::JobRegistry;
use crate::common::ids::JobId;
use crate::common::upload::{allowed_extension, sanitize_filename, stream_to_disk, IntakeError};
use crate::config::settings::ProcessingMode;
use crate::infrastructure::storage::StreamFormat;
use crate::state::AppState;

/// A source file saved under the upload root, ready for transcoding.
#[derive(Debug, Clone)]
pub struct AcceptedUpload {
    pub id: JobId,
    pub filename: String,
    pub source_path: PathBuf,
    pub size: u64,
}

pub struct StreamService;

impl StreamService {
    /// Validate the `file` part, mint a job identity and store the source.
    pub async fn accept_upload(state: &AppState, mut multipart: Multipart) -> Result<AcceptedUpload, IntakeError> {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some("file") {
                continue;
            }

            let original = field.file_name().unwrap_or_default().to_string();
            if original.is_empty() {
                return Err(IntakeError::EmptyFilename);
            }
            let ext = allowed_extension(&original).ok_or(IntakeError::DisallowedExtension)?;

            let mut filename = sanitize_filename(&original);
            if filename.is_empty() || allowed_extension(&filename).is_none() {
                filename = format!("source.{}", ext);
            }

            let id = state.ids.next_id();
            let layout = &state.layout;
            layout.ensure_source_dir(&id).await?;

            let source_path = layout.source_path(&id, &filename);
            let stored = match stream_to_disk(field, &source_path).await {
                Ok(size) => layout
                    .ensure_job_output_dir(&id)
                    .await
                    .map(|_| size)
                    .map_err(IntakeError::from),
                Err(e) => Err(e),
            };
            let size = match stored {
                Ok(size) => size,
                Err(e) => {
                    if let Err(cleanup) = layout.discard_job(&id).await {
                        warn!("Failed to clean up rejected upload {}: {}", id, cleanup);
                    }
                    return Err(e);
                }
            };

            return Ok(AcceptedUpload {
                id,
                filename,
                source_path,
                size,
            });
        }

        Err(IntakeError::MissingFilePart)
    }

    /// Transcode inline and wait for both formats.
    pub async fn process_now(state: &AppState, upload: &AcceptedUpload) -> PipelineOutcome {
        state.pipeline.run(&upload.id, &upload.source_path).await
    }

    /// Hand the job to the background workers.
    pub async fn enqueue(state: &AppState, upload: &AcceptedUpload) -> Result<()> {
        state
            .queue
            .publish(TranscodeJob {
                job_id: upload.id.clone(),
                source_path: upload.source_path.clone(),
            })
            .await
            .context("Failed to queue transcoding job")
    }

    /// Run or queue the pipeline according to the configured processing mode.
    pub async fn submit(state: &AppState, upload: AcceptedUpload) -> Result<UploadResponse> {
        info!(
            "Accepted upload {} as job {} ({} bytes)",
            upload.filename, upload.id, upload.size
        );

        match state.config.processing_mode {
            ProcessingMode::Sync => {
                let outcome = Self::process_now(state, &upload).await;
                Ok(Self::completed_response(state, &outcome))
            }
            ProcessingMode::Queued => {
                Self::enqueue(state, &upload).await?;
                Ok(Self::queued_response(state, &upload.id))
            }
        }
    }

    pub fn completed_response(state: &AppState, outcome: &PipelineOutcome) -> UploadResponse {
        let id = outcome.job_id.clone();
        if !outcome.succeeded() {
            return UploadResponse {
                id,
                status: UploadStatus::Failed,
                hls_url: None,
                dash_url: None,
                player_url: None,
                status_url: None,
            };
        }

        let layout = &state.layout;
        UploadResponse {
            hls_url: Some(layout.manifest_url(&id, StreamFormat::Hls)),
            dash_url: Some(layout.manifest_url(&id, StreamFormat::Dash)),
            player_url: Some(layout.player_url(&id)),
            status_url: None,
            status: UploadStatus::Success,
            id,
        }
    }

    pub fn queued_response(state: &AppState, id: &JobId) -> UploadResponse {
        let layout = &state.layout;
        UploadResponse {
            id: id.clone(),
            status: UploadStatus::Queued,
            hls_url: Some(layout.manifest_url(id, StreamFormat::Hls)),
            dash_url: Some(layout.manifest_url(id, StreamFormat::Dash)),
            player_url: Some(layout.player_url(id)),
            status_url: Some(format!("/api/v1/videos/{}", id)),
        }
    }

    pub async fn list_videos(state: &AppState) -> Result<Vec<VideoEntry>> {
        JobRegistry::list(&state.layout)
            .await
            .with_context(|| format!("Failed to read {}", state.layout.output_root().display()))
    }

    pub async fn video_status(state: &AppState, id: &JobId) -> Result<Option<VideoStatusResponse>> {
        let Some(video) = JobRegistry::find(&state.layout, id).await? else {
            return Ok(None);
        };
        let processing = state.queue.is_pending(id).await;
        Ok(Some(VideoStatusResponse { video, processing }))
    }
}
