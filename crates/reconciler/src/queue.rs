//! De-duplicating work queue and per-key requeue timers.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use hydroculture_core::NamespacedName;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// FIFO queue of object keys.
///
/// A key is queued at most once. A key that is re-added while its pass is
/// running is held back until [`WorkQueue::done`] is called for it, so two
/// passes never run for the same object at once.
#[derive(Debug, Default)]
pub struct WorkQueue {
    order: VecDeque<NamespacedName>,
    dirty: HashSet<NamespacedName>,
    processing: HashSet<NamespacedName>,
}

impl WorkQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as needing a pass.
    pub fn add(&mut self, key: NamespacedName) {
        if self.dirty.contains(&key) {
            return;
        }
        self.dirty.insert(key.clone());
        if self.processing.contains(&key) {
            return;
        }
        self.order.push_back(key);
    }

    /// Take the next key to process.
    pub fn pop(&mut self) -> Option<NamespacedName> {
        let key = self.order.pop_front()?;
        self.dirty.remove(&key);
        self.processing.insert(key.clone());
        Some(key)
    }

    /// Mark the pass for `key` finished, releasing any held-back re-add.
    pub fn done(&mut self, key: &NamespacedName) {
        self.processing.remove(key);
        if self.dirty.contains(key) {
            self.order.push_back(key.clone());
        }
    }

    /// Number of keys waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no key is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of keys with a pass running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.processing.len()
    }
}

/// Pending requeues, at most one per key.
///
/// Scheduling a key that already waits keeps the earlier deadline, so the
/// delay returned by a pass bounds how often that key comes back no matter
/// how many other triggers it sees.
#[derive(Debug, Default)]
pub struct RequeueTimers {
    timers: JoinSet<(NamespacedName, Instant)>,
    pending: HashMap<NamespacedName, Instant>,
}

impl RequeueTimers {
    /// Create an empty timer set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring `key` back after `delay`.
    ///
    /// Returns `false` when an earlier or equal deadline is already pending.
    pub fn add_after(&mut self, key: NamespacedName, delay: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(delay) else {
            return false;
        };
        if self.pending.get(&key).is_some_and(|existing| *existing <= deadline) {
            return false;
        }

        self.pending.insert(key.clone(), deadline);
        self.timers.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            (key, deadline)
        });
        true
    }

    /// Wait for the next key whose deadline passed.
    ///
    /// Timers superseded by an earlier deadline are skipped. Returns `None`
    /// once nothing is pending. Cancel safe.
    pub async fn next_due(&mut self) -> Option<NamespacedName> {
        while let Some(joined) = self.timers.join_next().await {
            let Ok((key, deadline)) = joined else {
                continue;
            };
            if self.pending.get(&key) == Some(&deadline) {
                self.pending.remove(&key);
                return Some(key);
            }
        }
        None
    }

    /// Number of keys waiting for their deadline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
