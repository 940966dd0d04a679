//! Keyed deferred-task scheduling for Parlor.
//!
//! [`Timers`] runs at most one pending deferred task per key. The engine
//! uses it for cleanup deadlines: schedule a reclaim when a match
//! finishes, cancel it when both players acknowledge first.
//!
//! # Cancellation semantics
//!
//! Cancellation is race-free: a fired task re-checks its registration
//! under the registry lock before running its body, so for every
//! scheduled task exactly one of these happens:
//!
//! - `cancel` removes the registration first → the body never runs;
//! - the fired task removes its own registration first → the body runs
//!   and a later `cancel` returns `false`.
//!
//! A task that is superseded by re-scheduling the same key behaves like
//! a cancelled one.
//!
//! The registry lock is a `std::sync::Mutex` held only for map access —
//! never across an await point.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::trace;

struct Entry {
    /// Distinguishes a live registration from a superseded one with the
    /// same key.
    generation: u64,
    abort: AbortHandle,
}

/// One pending deferred task per key, with cancellation.
///
/// Cheap to clone — clones share the same registry.
pub struct Timers<K> {
    entries: Arc<Mutex<HashMap<K, Entry>>>,
    next_generation: Arc<AtomicU64>,
}

impl<K> Clone for Timers<K> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            next_generation: Arc::clone(&self.next_generation),
        }
    }
}

impl<K> Default for Timers<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Timers<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Schedules `task` to run after `delay`, keyed by `key`.
    ///
    /// If a task is already pending for this key it is cancelled and
    /// replaced — the key has at most one pending task.
    pub fn schedule<F, Fut>(&self, key: K, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entries = Arc::clone(&self.entries);
        let task_key = key.clone();

        // Hold the registry lock across spawn + insert so the spawned
        // task cannot observe the map before its entry exists (relevant
        // under paused test time, where the sleep can elapse instantly).
        let mut map = lock(&self.entries);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Single-winner check: proceed only if our registration is
            // still the live one, and claim it by removing it.
            {
                let mut map = lock(&entries);
                match map.get(&task_key) {
                    Some(entry) if entry.generation == generation => {
                        map.remove(&task_key);
                    }
                    _ => {
                        trace!("deferred task superseded before firing");
                        return;
                    }
                }
            }

            task().await;
        });

        if let Some(old) = map.insert(
            key,
            Entry {
                generation,
                abort: handle.abort_handle(),
            },
        ) {
            old.abort.abort();
        }
    }

    /// Cancels the pending task for `key`.
    ///
    /// Returns `true` if a pending task was cancelled, `false` if none
    /// was pending (never scheduled, already fired, or already
    /// cancelled).
    pub fn cancel(&self, key: &K) -> bool {
        let entry = lock(&self.entries).remove(key);
        match entry {
            Some(entry) => {
                entry.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Whether a task is currently pending for `key`.
    pub fn is_scheduled(&self, key: &K) -> bool {
        lock(&self.entries).contains_key(key)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether no tasks are pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Locks the registry, recovering from a poisoned lock. The critical
/// sections only touch the map, so the data cannot be left inconsistent
/// by a panicking holder.
fn lock<K>(entries: &Mutex<HashMap<K, Entry>>) -> std::sync::MutexGuard<'_, HashMap<K, Entry>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
