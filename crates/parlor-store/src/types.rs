//! Storage-side data types.

use std::time::{SystemTime, UNIX_EPOCH};

use parlor_protocol::UserId;

/// Current wall-clock time as unix milliseconds.
///
/// Used for `QueueEntry::joined_at` and session creation stamps. Ordering
/// within a queue comes from insertion order, not from this value — two
/// entries created in the same millisecond still dequeue FIFO.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A player waiting in a matchmaking queue.
///
/// Unique per `(game kind, user)` — enqueueing the same user again
/// replaces the old entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// The waiting player.
    pub user_id: UserId,
    /// The name to seat them under when matched.
    pub display_name: String,
    /// Unix milliseconds when the player joined the queue. Preserved
    /// across a re-queue of partially popped entries.
    pub joined_at: u64,
}

impl QueueEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            joined_at: unix_millis(),
        }
    }
}
