//! Debounced, fire-and-forget persistence
//!
//! The session hands every new annotation list to a [`PersistSink`] and
//! moves on. [`DebouncedWriter`] coalesces bursts per key and writes a key
//! once it has been quiet for the configured delay. Each key keeps its own
//! deadline, so a busy document never holds back another one. Write
//! failures are logged and dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::storage_key::StorageKey;
use super::store::LocalStore;
use super::types::Annotation;
use crate::config::PersistenceConfig;

/// Receiver of annotation list changes
pub trait PersistSink: Send + Sync {
    /// Persist the full list under `key`
    fn persist(&self, key: &StorageKey, annotations: Arc<[Annotation]>);

    /// Drop everything stored under `key`
    fn remove(&self, key: &StorageKey);
}

enum PersistCommand {
    Save(StorageKey, Arc<[Annotation]>),
    Remove(StorageKey),
    Flush(oneshot::Sender<()>),
}

/// Latest state for one key; `value: None` means remove
struct PendingWrite {
    value: Option<Arc<[Annotation]>>,
    due: Instant,
}

type Pending = HashMap<StorageKey, PendingWrite>;

/// Handle to the background writer task
#[derive(Clone)]
pub struct DebouncedWriter {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl DebouncedWriter {
    /// Start the writer task. It exits, flushing pending writes, once every
    /// handle has been dropped.
    pub fn spawn(pool: SqlitePool, delay: Duration) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(pool, delay, rx));
        (Self { tx }, handle)
    }

    /// Start the writer with the configured debounce delay
    pub fn from_config(pool: SqlitePool, config: &PersistenceConfig) -> (Self, JoinHandle<()>) {
        tracing::debug!("Persisting annotations after {} ms of quiet", config.debounce_ms);
        Self::spawn(pool, config.debounce())
    }

    /// Write everything pending now and wait for it
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PersistCommand::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }

    fn send(&self, command: PersistCommand) {
        if self.tx.send(command).is_err() {
            tracing::warn!("Persistence writer has stopped; dropping write");
        }
    }
}

impl PersistSink for DebouncedWriter {
    fn persist(&self, key: &StorageKey, annotations: Arc<[Annotation]>) {
        self.send(PersistCommand::Save(key.clone(), annotations));
    }

    fn remove(&self, key: &StorageKey) {
        self.send(PersistCommand::Remove(key.clone()));
    }
}

async fn run_writer(
    pool: SqlitePool,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<PersistCommand>,
) {
    let mut pending = Pending::new();

    loop {
        let next_due = pending.values().map(|write| write.due).min();

        tokio::select! {
            command = rx.recv() => match command {
                Some(PersistCommand::Save(key, annotations)) => {
                    let due = Instant::now() + delay;
                    pending.insert(key, PendingWrite { value: Some(annotations), due });
                }
                Some(PersistCommand::Remove(key)) => {
                    let due = Instant::now() + delay;
                    pending.insert(key, PendingWrite { value: None, due });
                }
                Some(PersistCommand::Flush(done)) => {
                    write_all(&pool, take_due(&mut pending, None)).await;
                    let _ = done.send(());
                }
                None => {
                    write_all(&pool, take_due(&mut pending, None)).await;
                    tracing::debug!("Persistence writer stopped");
                    return;
                }
            },
            _ = quiet_period(next_due) => {
                let due = take_due(&mut pending, Some(Instant::now()));
                write_all(&pool, due).await;
            }
        }
    }
}

async fn quiet_period(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Remove and return the writes due at `now`, or every write when `now`
/// is `None`
fn take_due(
    pending: &mut Pending,
    now: Option<Instant>,
) -> Vec<(StorageKey, Option<Arc<[Annotation]>>)> {
    let due: Vec<StorageKey> = pending
        .iter()
        .filter(|(_, write)| now.map_or(true, |now| write.due <= now))
        .map(|(key, _)| key.clone())
        .collect();

    due.into_iter()
        .filter_map(|key| pending.remove(&key).map(|write| (key, write.value)))
        .collect()
}

async fn write_all(pool: &SqlitePool, writes: Vec<(StorageKey, Option<Arc<[Annotation]>>)>) {
    let store = LocalStore::new(pool);

    for (key, value) in writes {
        let result = match value {
            Some(annotations) => store.save_annotations(&key, &annotations).await,
            None => store.remove(&key).await.map(|_| ()),
        };

        match result {
            Ok(()) => tracing::debug!("Persisted annotations under {}", key),
            Err(e) => tracing::warn!("Failed to persist annotations under {}: {}", key, e),
        }
    }
}
