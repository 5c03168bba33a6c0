//! Runs both output formats for one job and classifies the result.
//!
//! HLS is encoded first, then DASH. A failure in one never stops the other,
//! so a job can end up with one servable format. Availability is decided by
//! manifest presence after the run, not by the encoder's exit status alone.

use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::common::ids::JobId;
use crate::infrastructure::encoder::Encoder;
use crate::infrastructure::storage::{ArtifactLayout, StreamFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub format: StreamFormat,
    pub encoded: bool,
    pub available: bool,
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub job_id: JobId,
    pub formats: Vec<FormatOutcome>,
}

impl PipelineOutcome {
    pub fn succeeded(&self) -> bool {
        !self.formats.is_empty() && self.formats.iter().all(|f| f.encoded && f.available)
    }

    pub fn format(&self, format: StreamFormat) -> Option<&FormatOutcome> {
        self.formats.iter().find(|f| f.format == format)
    }

    pub fn is_available(&self, format: StreamFormat) -> bool {
        self.format(format).is_some_and(|f| f.available)
    }

    pub fn available_formats(&self) -> impl Iterator<Item = StreamFormat> + '_ {
        self.formats.iter().filter(|f| f.available).map(|f| f.format)
    }
}

#[derive(Clone)]
pub struct TranscodePipeline {
    layout: ArtifactLayout,
    encoder: Arc<dyn Encoder>,
}

impl TranscodePipeline {
    pub fn new(layout: ArtifactLayout, encoder: Arc<dyn Encoder>) -> Self {
        Self { layout, encoder }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub async fn run(&self, id: &JobId, source: &Path) -> PipelineOutcome {
        info!("Processing job {} from {}", id, source.display());

        if let Err(e) = self.layout.ensure_output_dirs(id).await {
            // Each encoder call creates its own directory and reports failure per format.
            warn!("Failed to prepare output directories for {}: {}", id, e);
        }

        let mut formats = Vec::with_capacity(StreamFormat::ALL.len());
        for format in StreamFormat::ALL {
            formats.push(self.run_format(id, source, format).await);
        }

        let outcome = PipelineOutcome {
            job_id: id.clone(),
            formats,
        };

        if outcome.succeeded() {
            info!("Job {} completed: all formats available", id);
        } else {
            let available: Vec<_> = outcome.available_formats().map(|f| f.dir_name()).collect();
            error!("Job {} finished with failures; available formats: {:?}", id, available);
        }

        outcome
    }

    async fn run_format(&self, id: &JobId, source: &Path, format: StreamFormat) -> FormatOutcome {
        let output_dir = self.layout.output_dir(id, format);
        let result = self.encoder.encode(format, source, &output_dir).await;
        let available = self.layout.manifest_exists(id, format).await;

        match result {
            Ok(_) => {
                if !available {
                    warn!(job = %id, format = %format, "Encoder succeeded but manifest is missing");
                }
                FormatOutcome {
                    format,
                    encoded: true,
                    available,
                    diagnostic: None,
                }
            }
            Err(e) => {
                let diagnostic = e.diagnostic();
                error!(job = %id, format = %format, "{} conversion failed: {}", format, diagnostic);
                if available {
                    warn!(job = %id, format = %format, "Encoder failed but a manifest was left behind");
                }
                FormatOutcome {
                    format,
                    encoded: false,
                    available,
                    diagnostic: Some(diagnostic),
                }
            }
        }
    }
}
