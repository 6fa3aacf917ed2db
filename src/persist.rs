use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, warn};

use crate::models::Progress;
use crate::store::ProgressStore;

pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_secs(2);

/// Coalesces bursts of edits into one write: a snapshot is saved once no
/// newer one has arrived for `delay`.
#[derive(Debug)]
pub struct SaveDebouncer {
    tx: mpsc::UnboundedSender<Progress>,
    handle: JoinHandle<()>,
}

impl SaveDebouncer {
    pub fn spawn(store: Arc<dyn ProgressStore>, user_id: impl Into<String>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(store, user_id.into(), delay, rx));
        Self { tx, handle }
    }

    /// Replace the pending snapshot and restart the delay.
    pub fn schedule(&self, progress: Progress) {
        if self.tx.send(progress).is_err() {
            warn!("save task has stopped, snapshot dropped");
        }
    }

    /// Write whatever is pending now and stop the task.
    pub async fn flush(self) {
        let Self { tx, handle } = self;
        drop(tx);
        if let Err(e) = handle.await {
            error!(error = %e, "save task panicked");
        }
    }
}

async fn write(store: &dyn ProgressStore, user_id: &str, progress: &Progress) {
    if let Err(e) = store.save_progress(user_id, progress).await {
        error!(error = %e, user_id, "failed to save progress");
    }
}

async fn run(
    store: Arc<dyn ProgressStore>,
    user_id: String,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Progress>,
) {
    while let Some(mut pending) = rx.recv().await {
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(p) => pending = p,
                    None => {
                        debug!("flushing pending snapshot");
                        write(store.as_ref(), &user_id, &pending).await;
                        return;
                    }
                },
                () = time::sleep(delay) => break,
            }
        }
        write(store.as_ref(), &user_id, &pending).await;
    }
}
