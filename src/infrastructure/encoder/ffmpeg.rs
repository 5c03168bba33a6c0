use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info};

use super::{tail, EncodeOutput, Encoder, EncoderError, EncodingProfile, DIAGNOSTIC_TAIL_BYTES};
use crate::infrastructure::storage::StreamFormat;

/// Encoder backed by an ffmpeg binary on disk or on `PATH`.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill the process if a single invocation runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(
        &self,
        format: StreamFormat,
        input: &Path,
        output_dir: &Path,
    ) -> Result<EncodeOutput, EncoderError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| EncoderError::OutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let tool = self.tool_name();
        let args = EncodingProfile::for_format(format).args(input, output_dir);
        debug!(format = %format, "{} {}", self.program.display(), args.join(" "));

        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        let stderr = child.stderr.take();
        let run = async {
            let diagnostics = async {
                match stderr {
                    Some(stderr) => read_tail(stderr, DIAGNOSTIC_TAIL_BYTES).await.unwrap_or_default(),
                    None => Vec::new(),
                }
            };
            let (status, stderr) = tokio::join!(child.wait(), diagnostics);
            status.map(|status| (status, stderr))
        };

        // Dropping `child` on timeout kills the process.
        let (status, stderr) = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, run)
                .await
                .map_err(|_elapsed| EncoderError::Timeout {
                    tool: tool.clone(),
                    timeout,
                })?,
            None => run.await,
        }
        .map_err(|source| EncoderError::Wait {
            tool: tool.clone(),
            source,
        })?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(EncoderError::Exit {
                tool,
                status,
                stderr: tail(&stderr, DIAGNOSTIC_TAIL_BYTES).to_string(),
            });
        }

        let elapsed = started.elapsed();
        info!(format = %format, input = %input.display(), "{} conversion completed in {:.1?}", format, elapsed);

        Ok(EncodeOutput {
            format,
            manifest: output_dir.join(format.manifest_name()),
            elapsed,
        })
    }
}

/// Drain `reader`, keeping only the last `max` bytes.
async fn read_tail<R: AsyncRead + Unpin>(mut reader: R, max: usize) -> io::Result<Vec<u8>> {
    let mut kept = Vec::with_capacity(max);
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        kept.extend_from_slice(&buf[..n]);
        if kept.len() > max * 2 {
            kept.drain(..kept.len() - max);
        }
    }
    if kept.len() > max {
        kept.drain(..kept.len() - max);
    }
    Ok(kept)
}
