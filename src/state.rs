use std::sync::Arc;

use crate::common::ids::{IdGenerator, UuidGenerator};
use crate::config::settings::AppConfig;
use crate::infrastructure::encoder::{Encoder, FfmpegEncoder};
use crate::infrastructure::queue::TranscodeQueue;
use crate::infrastructure::storage::ArtifactLayout;
use crate::modules::stream::pipeline::TranscodePipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub layout: ArtifactLayout,
    pub pipeline: TranscodePipeline,
    pub queue: TranscodeQueue,
    pub ids: Arc<dyn IdGenerator>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        encoder: Arc<dyn Encoder>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let layout = ArtifactLayout::new(&config.upload_dir, &config.output_dir);
        let pipeline = TranscodePipeline::new(layout.clone(), encoder);

        Self {
            config,
            layout,
            pipeline,
            queue: TranscodeQueue::unbounded(),
            ids,
        }
    }

    /// Production wiring: ffmpeg from the configured path and random UUID job ids.
    pub fn from_config(config: AppConfig) -> Self {
        let encoder = FfmpegEncoder::new(&config.ffmpeg_bin).with_timeout(config.encoder_timeout);
        Self::new(config, Arc::new(encoder), Arc::new(UuidGenerator))
    }
}
