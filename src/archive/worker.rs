//! The archival worker loop.
//!
//! Exactly one worker runs per process, started after cache rehydration.
//! It waits for a job, drains everything currently queued in enqueue
//! order, then pauses before waiting again so a pin storm turns into a
//! trickle of outbound sends instead of a burst that trips the platform's
//! rate limits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::queue::JobReceiver;
use super::PinArchiver;

/// Pause between drain batches
const DRAIN_PAUSE: Duration = Duration::from_secs(1);

/// Handle to control the running worker
pub struct WorkerHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    /// Stop the worker and wait for it to finish.
    ///
    /// A job already dequeued when the signal arrives is allowed to
    /// finish; the loop does not resume afterwards.
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Spawn the single consumer loop over the job queue
pub fn spawn(archiver: Arc<PinArchiver>, jobs: JobReceiver) -> WorkerHandle {
    let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
    let task = tokio::spawn(run_worker(archiver, jobs, stop_rx));
    WorkerHandle { stop_tx, task }
}

async fn run_worker(
    archiver: Arc<PinArchiver>,
    mut jobs: JobReceiver,
    mut stop_rx: mpsc::Receiver<()>,
) {
    info!("archival worker started");

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                info!("archival worker stopping");
                break;
            }
            job = jobs.next() => {
                let Some(job) = job else {
                    debug!("job queue closed, worker exiting");
                    break;
                };

                archiver.archive(job).await;
                while let Some(job) = jobs.try_next() {
                    archiver.archive(job).await;
                }

                tokio::time::sleep(DRAIN_PAUSE).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testing::NullGateway;
    use crate::store::SettingsStore;
    use tempfile::TempDir;

    async fn test_archiver() -> (Arc<PinArchiver>, JobReceiver, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::open(temp.path().join("settings.db"))
            .await
            .unwrap();
        let (archiver, jobs) = PinArchiver::new(store, Arc::new(NullGateway));
        (archiver, jobs, temp)
    }

    #[tokio::test]
    async fn test_stop_with_empty_queue() {
        let (archiver, jobs, _temp) = test_archiver().await;

        let handle = spawn(archiver, jobs);
        // Let the worker reach its wait point before signalling
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_is_prompt() {
        let (archiver, jobs, _temp) = test_archiver().await;
        let handle = spawn(archiver, jobs);

        tokio::time::timeout(Duration::from_secs(2), handle.stop())
            .await
            .expect("worker did not stop in time")
            .unwrap();
    }
}
