//! Trailing-edge debounce for autosave-style writes.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::ClientError;

/// Advisory save state for the view. Not a durability guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error(String),
}

/// Collapses bursts of updates into one trailing send.
///
/// The first value passed to [`update`](Self::update) is the value the view
/// opened with and is never sent. Each later update restarts the quiescence
/// window; only the last value of a burst reaches `send`. Dropping the handle
/// flushes a still-pending value instead of losing it.
pub struct Debounced<T> {
    tx: mpsc::UnboundedSender<T>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debounced<T> {
    pub fn spawn<F, Fut>(window: Duration, mut send: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ClientError>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let (status_tx, status) = watch::channel(SaveStatus::Idle);

        let task = tokio::spawn(async move {
            // Mount value: content as opened, nothing to save
            if rx.recv().await.is_none() {
                return;
            }

            let mut pending: Option<T> = None;
            loop {
                let Some(value) = pending.take() else {
                    match rx.recv().await {
                        Some(next) => {
                            pending = Some(next);
                            continue;
                        }
                        None => break,
                    }
                };

                tokio::select! {
                    next = rx.recv() => match next {
                        Some(next) => pending = Some(next),
                        None => {
                            flush(&mut send, &status_tx, value).await;
                            break;
                        }
                    },
                    _ = tokio::time::sleep(window) => {
                        flush(&mut send, &status_tx, value).await;
                    }
                }
            }
        });

        Self { tx, status, task }
    }

    /// Record a new value, restarting the window.
    pub fn update(&self, value: T) {
        if self.tx.send(value).is_err() {
            tracing::warn!("debounced writer already stopped, update dropped");
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// Receiver that wakes on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Stop accepting updates, send anything pending now, and wait for it.
    pub async fn finish(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::error!("debounced writer task failed: {e}");
        }
    }
}

async fn flush<T, F, Fut>(send: &mut F, status: &watch::Sender<SaveStatus>, value: T)
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), ClientError>>,
{
    status.send_replace(SaveStatus::Saving);
    match send(value).await {
        Ok(()) => {
            status.send_replace(SaveStatus::Saved);
        }
        Err(e) => {
            tracing::warn!(error = %e, "debounced save failed");
            status.send_replace(SaveStatus::Error(e.to_string()));
        }
    }
}
