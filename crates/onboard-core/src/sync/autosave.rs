//! Debounced draft autosave
//!
//! Every input hands the latest form state to `Autosaver::touch`. A
//! background task writes it to the draft slot once no further input has
//! arrived for the quiescence window. Autosave is best-effort: write
//! failures are logged and the next input simply tries again.
//!
//! The controller keeps an `AutosaveLink` to every autosaver it starts and
//! discards their pending state before a draft is promoted to the outbox.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::models::Draft;
use crate::storage::{DurableStore, DurableStoreExt};

enum Command {
    Touch(Draft),
    Flush(oneshot::Sender<()>),
    Discard(oneshot::Sender<()>),
}

/// Handle to a running autosave task
pub struct Autosaver {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl Autosaver {
    /// Start the autosave task for `store`
    pub fn spawn<S>(store: Arc<S>, debounce: Duration) -> Self
    where
        S: DurableStore + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(autosave_loop(store, debounce, rx));
        Self { tx, task }
    }

    /// Record new form state and restart the quiescence window
    pub fn touch(&self, draft: Draft) {
        let _ = self.tx.send(Command::Touch(draft));
    }

    /// Drop any pending state without writing it
    ///
    /// Returns once any write already in progress has finished.
    pub async fn discard(&self) {
        self.link().discard().await;
    }

    /// Write pending state now and wait for the write to finish
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Flush and stop the task
    pub async fn shutdown(self) {
        self.flush().await;
        drop(self.tx);
        let _ = self.task.await;
    }

    pub(crate) fn link(&self) -> AutosaveLink {
        AutosaveLink {
            tx: self.tx.downgrade(),
        }
    }
}

/// Side channel into an autosaver that does not keep it running
///
/// The task stops when its `Autosaver` is dropped or shut down, whatever
/// links remain.
#[derive(Clone)]
pub(crate) struct AutosaveLink {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl AutosaveLink {
    /// False once the owning `Autosaver` is gone
    pub(crate) fn is_alive(&self) -> bool {
        self.tx.upgrade().is_some()
    }

    pub(crate) async fn discard(&self) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        let sent = tx.send(Command::Discard(ack_tx)).is_ok();
        drop(tx);
        if sent {
            let _ = ack_rx.await;
        }
    }
}

async fn autosave_loop<S>(
    store: Arc<S>,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) where
    S: DurableStore + ?Sized,
{
    let mut pending: Option<Draft> = None;
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Touch(draft)) => {
                    pending = Some(draft);
                    deadline = Instant::now() + debounce;
                }
                Some(Command::Flush(ack)) => {
                    if let Some(draft) = pending.take() {
                        write(store.as_ref(), &draft).await;
                    }
                    let _ = ack.send(());
                }
                Some(Command::Discard(ack)) => {
                    pending = None;
                    let _ = ack.send(());
                }
                None => {
                    if let Some(draft) = pending.take() {
                        write(store.as_ref(), &draft).await;
                    }
                    break;
                }
            },
            _ = sleep_until(deadline), if pending.is_some() => {
                if let Some(draft) = pending.take() {
                    write(store.as_ref(), &draft).await;
                }
            }
        }
    }
}

async fn write<S>(store: &S, draft: &Draft)
where
    S: DurableStore + ?Sized,
{
    match store.save_draft(draft).await {
        Ok(()) => debug!("Draft autosaved"),
        Err(e) => warn!(error = %e, "Autosave failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn draft_with(company: &str) -> Draft {
        let mut draft = Draft::skeleton();
        draft.set("company_name", company);
        draft
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_after_quiescence() {
        let store = Arc::new(MemoryStore::new());
        let autosaver = Autosaver::spawn(store.clone(), Duration::from_millis(400));

        autosaver.touch(draft_with("A"));
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(store.load_draft().await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.load_draft().await.unwrap(), draft_with("A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_input_restarts_window() {
        let store = Arc::new(MemoryStore::new());
        let autosaver = Autosaver::spawn(store.clone(), Duration::from_millis(400));

        autosaver.touch(draft_with("A"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        autosaver.touch(draft_with("AB"));
        tokio::time::sleep(Duration::from_millis(300)).await;

        // 600ms since first input, but only 300ms of quiet
        assert!(store.load_draft().await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.load_draft().await.unwrap(), draft_with("AB"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let store = Arc::new(MemoryStore::new());
        let autosaver = Autosaver::spawn(store.clone(), Duration::from_secs(60));

        autosaver.touch(draft_with("Now"));
        autosaver.flush().await;
        assert_eq!(store.load_draft().await.unwrap(), draft_with("Now"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_drops_pending_state() {
        let store = Arc::new(MemoryStore::new());
        let autosaver = Autosaver::spawn(store.clone(), Duration::from_millis(400));

        autosaver.touch(draft_with("Stale"));
        autosaver.discard().await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        autosaver.shutdown().await;

        assert!(store.load_draft().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failures_are_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let autosaver = Autosaver::spawn(store.clone(), Duration::from_millis(400));

        autosaver.touch(draft_with("Lost"));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(store.load_draft().await.unwrap().is_empty());

        // Next input after the fault clears gets saved
        store.set_fail_writes(false);
        autosaver.touch(draft_with("Kept"));
        autosaver.shutdown().await;
        assert_eq!(store.load_draft().await.unwrap(), draft_with("Kept"));
    }
}
