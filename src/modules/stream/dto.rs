use serde::Serialize;
use utoipa::ToSchema;

use crate::common::ids::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Both conversions finished and both manifests exist.
    Success,
    /// At least one conversion failed.
    Failed,
    /// Accepted; conversions run in the background.
    Queued,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    #[schema(value_type = String)]
    pub id: JobId,
    pub status: UploadStatus,
    pub hls_url: Option<String>,
    pub dash_url: Option<String>,
    pub player_url: Option<String>,
    /// Where to poll for progress (queued uploads only).
    pub status_url: Option<String>,
}

/// Derived availability of one job, as seen on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VideoEntry {
    #[schema(value_type = String)]
    pub id: JobId,
    pub hls_url: Option<String>,
    pub dash_url: Option<String>,
    pub player_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoStatusResponse {
    #[serde(flatten)]
    pub video: VideoEntry,
    /// True while the job is waiting for or running on a worker.
    pub processing: bool,
}
