//! Bounded queue of job IDs.
//!
//! The queue only carries hints: an ID on the queue means "this job may be
//! ready". Consumers must still win [`JobStore::claim`] before doing any work,
//! so duplicates are harmless.
//!
//! [`JobStore::claim`]: crate::store::JobStore::claim

use crate::job::JobId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tracing::debug;

/// Result of a non-blocking offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The ID was buffered.
    Accepted,
    /// The queue is at capacity; the ID was dropped.
    Full,
    /// The queue has been closed; the ID was dropped.
    Closed,
}

impl Offer {
    /// Returns true if the ID was buffered.
    pub fn is_accepted(self) -> bool {
        matches!(self, Offer::Accepted)
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Configured capacity.
    pub capacity: usize,

    /// IDs currently buffered.
    pub buffered: usize,

    /// Whether the queue still accepts offers.
    pub open: bool,
}

/// Fixed-capacity, multi-producer, multi-consumer queue of job IDs.
pub struct JobQueue {
    /// Sender half; `None` once closed.
    tx: RwLock<Option<mpsc::Sender<JobId>>>,

    /// Receiver half, shared by every consumer.
    rx: Mutex<mpsc::Receiver<JobId>>,

    capacity: usize,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` IDs.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`JobsConfig::validate`] rejects that
    /// value before a queue is built.
    ///
    /// [`JobsConfig::validate`]: crate::config::JobsConfig::validate
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx: RwLock::new(Some(tx)),
            rx: Mutex::new(rx),
            capacity,
        }
    }

    /// Try to buffer an ID without waiting.
    pub fn offer(&self, id: JobId) -> Offer {
        let guard = self.tx.read();
        let Some(tx) = guard.as_ref() else {
            return Offer::Closed;
        };

        match tx.try_send(id) {
            Ok(()) => Offer::Accepted,
            Err(TrySendError::Full(id)) => {
                debug!(job_id = %id, capacity = self.capacity, "Queue full, dropping offer");
                Offer::Full
            }
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    /// Wait for the next ID.
    ///
    /// Returns `None` once the queue is closed and every buffered ID has been
    /// handed out. Cancel-safe: dropping the future loses no ID.
    pub async fn recv(&self) -> Option<JobId> {
        self.rx.lock().await.recv().await
    }

    /// Stop accepting offers. Already buffered IDs can still be received.
    pub fn close(&self) {
        if self.tx.write().take().is_some() {
            debug!("Job queue closed");
        }
    }

    /// Whether the queue still accepts offers.
    pub fn is_open(&self) -> bool {
        self.tx.read().is_some()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// IDs currently buffered.
    pub fn len(&self) -> usize {
        match self.tx.read().as_ref() {
            Some(tx) => self.capacity - tx.capacity(),
            None => self.rx.try_lock().map(|rx| rx.len()).unwrap_or(0),
        }
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of queue statistics.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            capacity: self.capacity,
            buffered: self.len(),
            open: self.is_open(),
        }
    }
}
