use anyhow::{anyhow, Result};
use async_channel::{Receiver, Sender};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::common::ids::JobId;
use crate::modules::stream::events::TranscodeJob;

/// `pending` holds jobs that are queued or running. It only feeds the
/// `processing` flag; availability is always read from disk.
#[derive(Clone)]
pub struct TranscodeQueue {
    sender: Sender<TranscodeJob>,
    receiver: Receiver<TranscodeJob>,
    pending: Arc<Mutex<HashSet<JobId>>>,
}

impl TranscodeQueue {
    pub fn unbounded() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self {
            sender,
            receiver,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn publish(&self, job: TranscodeJob) -> Result<()> {
        let id = job.job_id.clone();
        self.pending.lock().await.insert(id.clone());

        if let Err(e) = self.sender.send(job).await {
            warn!("Transcode queue closed, dropping job {}", id);
            self.pending.lock().await.remove(&id);
            return Err(anyhow!("Failed to enqueue job {}: {}", id, e));
        }

        info!("Queued transcoding job {} ({} waiting)", id, self.sender.len());
        Ok(())
    }

    pub fn consumer(&self) -> Receiver<TranscodeJob> {
        self.receiver.clone()
    }

    pub async fn is_pending(&self, id: &JobId) -> bool {
        self.pending.lock().await.contains(id)
    }

    pub async fn complete(&self, id: &JobId) {
        self.pending.lock().await.remove(id);
    }

    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    /// Stop accepting work; workers drain what is already queued and exit.
    pub fn close(&self) {
        self.sender.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job(id: &str) -> TranscodeJob {
        TranscodeJob {
            job_id: JobId::new(id),
            source_path: PathBuf::from(format!("uploads/{id}/in.mp4")),
        }
    }

    #[tokio::test]
    async fn publish_marks_pending_until_complete() {
        let queue = TranscodeQueue::unbounded();
        queue.publish(job("a")).await.unwrap();
        assert!(queue.is_pending(&JobId::new("a")).await);
        assert_eq!(queue.len(), 1);

        let received = queue.consumer().recv().await.unwrap();
        assert_eq!(received.job_id.as_str(), "a");
        assert!(queue.is_pending(&JobId::new("a")).await);

        queue.complete(&received.job_id).await;
        assert!(!queue.is_pending(&JobId::new("a")).await);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn publish_after_close_fails_and_clears_pending() {
        let queue = TranscodeQueue::unbounded();
        queue.close();
        assert!(queue.publish(job("b")).await.is_err());
        assert!(!queue.is_pending(&JobId::new("b")).await);
    }
}
