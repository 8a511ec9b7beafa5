//! Job queue for server mode
//!
//! A single worker drains the queue, so at most one download runs at a time.

use crate::models::DownloadRecord;
use crate::workflow::batch::BatchRunner;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pending jobs held before submitters are pushed back
const QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Download queue is full")]
    Full,

    #[error("Download worker has stopped")]
    Closed,
}

/// Submitting side of the queue
#[derive(Clone)]
pub struct DownloadQueue {
    tx: mpsc::Sender<DownloadRecord>,
}

impl DownloadQueue {
    /// Create the queue and spawn its worker
    pub fn start(runner: Arc<BatchRunner>, job_timeout: Duration) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let handle = tokio::spawn(worker(runner, rx, job_timeout));
        (Self { tx }, handle)
    }

    pub fn submit(&self, record: DownloadRecord) -> Result<(), QueueError> {
        self.tx.try_send(record).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

async fn worker(runner: Arc<BatchRunner>, mut rx: mpsc::Receiver<DownloadRecord>, job_timeout: Duration) {
    tracing::info!("Download worker started");

    while let Some(mut record) = rx.recv().await {
        let status = runner.run_with_timeout(&mut record, job_timeout).await;
        tracing::debug!(download_id = %record.id, status = %status, "Job finished");
    }

    tracing::info!("Download worker stopped");
}
