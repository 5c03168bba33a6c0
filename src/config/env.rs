use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    UploadDir,
    OutputDir,
    FfmpegBin,
    MaxUploadBytes,
    ProcessingMode,
    WorkerCount,
    EncoderTimeoutSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::UploadDir => "UPLOAD_DIR",
            EnvKey::OutputDir => "OUTPUT_DIR",
            EnvKey::FfmpegBin => "FFMPEG_BIN",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
            EnvKey::ProcessingMode => "PROCESSING_MODE",
            EnvKey::WorkerCount => "WORKER_COUNT",
            EnvKey::EncoderTimeoutSecs => "ENCODER_TIMEOUT_SECS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Like [`get_parsed`], but an unset or unparseable value yields `None`.
pub fn get_optional<T: FromStr>(key: EnvKey) -> Option<T> {
    get(key).ok().and_then(|val| val.parse::<T>().ok())
}
