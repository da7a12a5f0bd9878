//! Task queue with per-merge-request single flight.
//!
//! Two limits apply to every submitted task:
//!
//! - per key (MR id): tasks run strictly one after another, in submission
//!   order; a later task waits for the earlier one to finish
//! - global: at most `max_concurrent` tasks execute at once
//!
//! The position in a key's line is taken synchronously in
//! [`KeyedGate::enqueue`], before the task is spawned, so submission order
//! is execution order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Semaphore, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Last queued turn of a key.
struct Tail {
    seq: u64,
    done: oneshot::Receiver<()>,
}

/// FIFO line per key. Entries disappear once a key has nothing queued.
#[derive(Default)]
pub struct KeyedGate {
    tails: Mutex<HashMap<String, Tail>>,
    next_seq: AtomicU64,
}

impl KeyedGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Takes the next place in `key`'s line.
    pub fn enqueue(self: &Arc<Self>, key: &str) -> Turn {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let prev = self
            .lock()
            .insert(key.to_string(), Tail { seq, done: rx })
            .map(|tail| tail.done);
        Turn {
            gate: Arc::clone(self),
            key: key.to_string(),
            seq,
            prev,
            _done: tx,
        }
    }

    /// Number of keys with queued or running turns.
    pub fn active_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Tail>> {
        self.tails.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(&self, key: &str, seq: u64) {
        let mut tails = self.lock();
        if tails.get(key).is_some_and(|t| t.seq == seq) {
            tails.remove(key);
        }
    }
}

/// A reserved place in a key's line.
pub struct Turn {
    gate: Arc<KeyedGate>,
    key: String,
    seq: u64,
    prev: Option<oneshot::Receiver<()>>,
    /// Dropped with the turn; wakes the next one.
    _done: oneshot::Sender<()>,
}

impl Turn {
    /// Waits until every earlier turn of the same key has finished.
    pub async fn wait(mut self) -> TurnGuard {
        if let Some(prev) = self.prev.take() {
            // Err means the previous turn was dropped: it finished either way.
            let _ = prev.await;
        }
        TurnGuard { turn: self }
    }
}

/// Holds the key until dropped; the next turn starts afterwards.
pub struct TurnGuard {
    turn: Turn,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.turn.gate.release(&self.turn.key, self.turn.seq);
    }
}

/// Spawns keyed tasks under the per-key and global limits.
#[derive(Clone)]
pub struct TaskQueue {
    gate: Arc<KeyedGate>,
    permits: Arc<Semaphore>,
}

impl TaskQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            gate: KeyedGate::new(),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Spawns `fut` behind earlier tasks of `key`, then behind a global permit.
    pub fn spawn_keyed<F>(&self, key: &str, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let turn = self.gate.enqueue(key);
        let permits = Arc::clone(&self.permits);
        let key = key.to_string();

        tokio::spawn(async move {
            let _turn = turn.wait().await;
            let Ok(_permit) = permits.acquire_owned().await else {
                warn!(key = %key, "task queue closed, dropping task");
                return;
            };
            debug!(key = %key, "task started");
            fut.await;
        })
    }

    pub fn active_keys(&self) -> usize {
        self.gate.active_keys()
    }
}
