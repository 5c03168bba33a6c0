use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::config::env::{self, EnvKey};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// How an accepted upload reaches the transcoding pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// The upload request waits for both conversions before responding.
    Sync,
    /// The upload is acknowledged immediately and transcoded by a background worker.
    #[default]
    Queued,
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(ProcessingMode::Sync),
            "queued" | "queue" | "async" => Ok(ProcessingMode::Queued),
            other => Err(format!("unknown processing mode '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub max_upload_bytes: usize,
    pub processing_mode: ProcessingMode,
    pub worker_count: usize,
    pub encoder_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 5000),
            upload_dir: PathBuf::from(env::get_or(EnvKey::UploadDir, "uploads")),
            output_dir: PathBuf::from(env::get_or(EnvKey::OutputDir, "streams")),
            ffmpeg_bin: PathBuf::from(env::get_or(EnvKey::FfmpegBin, "ffmpeg")),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
            processing_mode: env::get_parsed(EnvKey::ProcessingMode, ProcessingMode::default()),
            worker_count: env::get_parsed(EnvKey::WorkerCount, 1usize).max(1),
            encoder_timeout: env::get_optional::<u64>(EnvKey::EncoderTimeoutSecs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Configuration rooted at the given directories, with every other knob at its default.
    pub fn with_roots(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_port: 5000,
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            processing_mode: ProcessingMode::default(),
            worker_count: 1,
            encoder_timeout: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
