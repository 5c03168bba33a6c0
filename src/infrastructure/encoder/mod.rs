//! Adapter around the external transcoding tool.
//!
//! The pipeline only sees the [`Encoder`] trait; the ffmpeg invocation
//! templates live in [`profile`] so they can be versioned independently.

pub mod ffmpeg;
pub mod profile;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use crate::infrastructure::storage::StreamFormat;

pub use ffmpeg::FfmpegEncoder;
pub use profile::EncodingProfile;

/// Maximum number of stderr bytes kept for diagnostics.
pub const DIAGNOSTIC_TAIL_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct EncodeOutput {
    pub format: StreamFormat,
    pub manifest: PathBuf,
    pub elapsed: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("failed to prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error waiting for {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },
}

impl EncoderError {
    /// Diagnostic text suitable for logging next to the job id.
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }
}

/// Runs one transcode of `input` into `output_dir` for a single format.
///
/// Implementations make exactly one attempt and report failure as a value;
/// partially written files are left in place.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(
        &self,
        format: StreamFormat,
        input: &Path,
        output_dir: &Path,
    ) -> Result<EncodeOutput, EncoderError>;
}

/// Keep the last `max` bytes of tool output, on a char boundary.
pub(crate) fn tail(text: &str, max: usize) -> &str {
    let text = text.trim();
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_end_of_output() {
        assert_eq!(tail("  short  ", 16), "short");
        assert_eq!(tail("0123456789", 4), "6789");
        assert_eq!(tail("ééé", 3), "é");
    }
}
