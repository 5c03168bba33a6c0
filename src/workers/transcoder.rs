use crate::modules::stream::events::TranscodeJob;
use crate::modules::stream::pipeline::PipelineOutcome;
use crate::state::AppState;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Spawn `count` workers consuming the transcode queue.
///
/// Each worker handles one job at a time, and each job runs its two
/// conversions in sequence, so `count` bounds concurrent ffmpeg processes.
pub fn spawn_transcoder_workers(state: &AppState, count: usize) -> Vec<JoinHandle<()>> {
    (0..count.max(1))
        .map(|worker_id| tokio::spawn(start_transcoder_worker(state.clone(), worker_id)))
        .collect()
}

pub async fn start_transcoder_worker(state: AppState, worker_id: usize) {
    info!("🎥 Starting Transcoder Worker #{}...", worker_id);

    let consumer = state.queue.consumer();

    while let Ok(job) = consumer.recv().await {
        info!("📦 Worker #{} received transcoding job {}", worker_id, job.job_id);

        match AssertUnwindSafe(process_job(&state, &job)).catch_unwind().await {
            Ok(outcome) if outcome.succeeded() => {
                info!("✅ Job completed successfully: {}", job.job_id);
            }
            Ok(_) => {
                error!("❌ Job {} finished with at least one failed format", job.job_id);
            }
            Err(_) => {
                error!("💥 Worker #{} panicked while processing job {}", worker_id, job.job_id);
            }
        }

        state.queue.complete(&job.job_id).await;
    }

    info!("🎥 Transcoder Worker #{} stopped: queue closed", worker_id);
}

pub async fn process_job(state: &AppState, job: &TranscodeJob) -> PipelineOutcome {
    state.pipeline.run(&job.job_id, &job.source_path).await
}
