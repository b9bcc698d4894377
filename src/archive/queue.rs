//! Unbounded archival job queue.
//!
//! A thin wrapper over a tokio unbounded MPSC channel. The queue is
//! deliberately unbounded: pin events are rare relative to message volume,
//! and dropping or blocking inbound platform events is worse than letting
//! the queue grow under a burst. Single-consumer is enforced by
//! construction — [`JobReceiver`] is not cloneable and is moved into the
//! worker loop.

use tokio::sync::mpsc;

use crate::domain::ArchiveJob;

/// Create a connected sender/receiver pair
pub fn channel() -> (JobSender, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (JobSender { tx }, JobReceiver { rx })
}

/// Producer half of the queue; cheap to clone, safe to use from
/// concurrently running event handlers.
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: mpsc::UnboundedSender<ArchiveJob>,
}

impl JobSender {
    /// Enqueue a job without blocking.
    ///
    /// Returns `false` only if the receiver side is gone, which means the
    /// worker has shut down and the job will never be processed.
    pub fn enqueue(&self, job: ArchiveJob) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// Consumer half of the queue; owned exclusively by the worker loop.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<ArchiveJob>,
}

impl JobReceiver {
    /// Wait for the next job. Returns `None` once all senders are dropped
    /// and the queue is drained.
    pub async fn next(&mut self) -> Option<ArchiveJob> {
        self.rx.recv().await
    }

    /// Take the next job only if one is already queued
    pub fn try_next(&mut self) -> Option<ArchiveJob> {
        self.rx.try_recv().ok()
    }
}
