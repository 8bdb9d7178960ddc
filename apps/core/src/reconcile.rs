use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::history_cache::HistoryCache;
use crate::history_store::HistoryStore;
use crate::logging;

/// Persistence jobs, drained in FIFO order so a path's uses reach the store
/// in the order they happened.
pub enum Job {
    PersistUse(String),
    RemoveHistory(String),
    Refresh,
    Flush(Sender<()>),
}

/// Background thread that persists cache mutations and then refreshes the
/// mirror from the authoritative store. Failures are logged and absorbed;
/// nothing here ever surfaces into the launch flow.
pub struct ReconcileWorker {
    sender: Sender<Job>,
    handle: Option<JoinHandle<()>>,
}

/// Cheap cloneable queue handle for the dispatcher.
#[derive(Clone)]
pub struct WorkerHandle {
    sender: Sender<Job>,
}

impl WorkerHandle {
    pub fn queue_use(&self, key: &str) {
        self.send(Job::PersistUse(key.to_string()));
    }

    pub fn queue_remove(&self, key: &str) {
        self.send(Job::RemoveHistory(key.to_string()));
    }

    pub fn queue_refresh(&self) {
        self.send(Job::Refresh);
    }

    /// Block until previously queued jobs are processed. Only failure paths
    /// and teardown use this; the launch happy path never waits.
    pub fn flush(&self) {
        let (ack_sender, ack_receiver) = channel();
        if self.sender.send(Job::Flush(ack_sender)).is_ok() {
            let _ = ack_receiver.recv();
        }
    }

    fn send(&self, job: Job) {
        if self.sender.send(job).is_err() {
            logging::warn("reconcile worker is gone; dropping persistence job");
        }
    }
}

impl ReconcileWorker {
    pub fn spawn(cache: Arc<HistoryCache>, store: Arc<dyn HistoryStore>) -> Self {
        let (sender, receiver) = channel();
        let handle = std::thread::Builder::new()
            .name("reconcile-worker".to_string())
            .spawn(move || run_loop(receiver, cache, store))
            .ok();
        if handle.is_none() {
            logging::error("failed to spawn reconcile worker; persistence is disabled");
        }
        Self {
            sender,
            handle,
        }
    }

    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            sender: self.sender.clone(),
        }
    }

    /// Block until every job queued so far has been processed.
    pub fn flush(&self) {
        self.handle().flush();
    }
}

impl Drop for ReconcileWorker {
    fn drop(&mut self) {
        // closing the channel ends the loop
        let (closed_sender, _) = channel();
        drop(std::mem::replace(&mut self.sender, closed_sender));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_loop(receiver: Receiver<Job>, cache: Arc<HistoryCache>, store: Arc<dyn HistoryStore>) {
    for job in receiver {
        match job {
            Job::PersistUse(key) => {
                if let Err(error) = store.add_use(&key) {
                    // mirror stays optimistic; the next reconcile converges it
                    logging::warn(&format!("persist use failed for {key}: {error}"));
                }
                refresh_mirror(&cache, store.as_ref());
            }
            Job::RemoveHistory(key) => {
                if let Err(error) = store.delete_history(&key) {
                    logging::warn(&format!("history delete failed for {key}: {error}"));
                }
                refresh_mirror(&cache, store.as_ref());
            }
            Job::Refresh => refresh_mirror(&cache, store.as_ref()),
            Job::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

/// Idempotent: always moves the mirror toward the store's current truth,
/// regardless of interleaving with optimistic updates.
fn refresh_mirror(cache: &HistoryCache, store: &dyn HistoryStore) {
    match store.list_all_history() {
        Ok(entries) => cache.reconcile(entries),
        Err(error) => logging::warn(&format!("history reconcile failed: {error}")),
    }
}
