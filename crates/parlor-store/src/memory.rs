//! In-memory `MatchStore` implementation.
//!
//! All three maps live behind a single async mutex, so every trait
//! method is one critical section — the cheapest way to honor the
//! atomicity contract in one process. A networked store would reach the
//! same guarantees with transactions or compare-and-swap.

use std::collections::{HashMap, VecDeque};

use parlor_protocol::{GameKind, RoomId, Session, UserId};
use tokio::sync::Mutex;

use crate::{MatchStore, QueueEntry, StoreError};

#[derive(Default)]
struct Inner {
    /// FIFO queue of waiting players, per game kind.
    queues: HashMap<GameKind, VecDeque<QueueEntry>>,
    /// Authoritative sessions, keyed by room id.
    sessions: HashMap<RoomId, Session>,
    /// One live room per user. Kept in sync with `sessions` by the
    /// engine's reclaim protocol.
    user_rooms: HashMap<UserId, RoomId>,
}

/// A single-process [`MatchStore`] backed by hash maps.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for MemoryStore {
    async fn enqueue(&self, kind: GameKind, entry: QueueEntry) {
        let mut inner = self.inner.lock().await;
        let queue = inner.queues.entry(kind).or_default();
        // One entry per user: a fresh request supersedes a stale one.
        queue.retain(|e| e.user_id != entry.user_id);
        queue.push_back(entry);
    }

    async fn queue_len(&self, kind: GameKind) -> usize {
        let inner = self.inner.lock().await;
        inner.queues.get(&kind).map_or(0, VecDeque::len)
    }

    async fn dequeue_up_to(&self, kind: GameKind, n: usize) -> Vec<QueueEntry> {
        let mut inner = self.inner.lock().await;
        let Some(queue) = inner.queues.get_mut(&kind) else {
            return Vec::new();
        };
        let take = n.min(queue.len());
        queue.drain(..take).collect()
    }

    async fn queued(&self, kind: GameKind, user: &UserId) -> bool {
        let inner = self.inner.lock().await;
        inner
            .queues
            .get(&kind)
            .is_some_and(|q| q.iter().any(|e| &e.user_id == user))
    }

    async fn remove_queued(&self, kind: GameKind, user: &UserId) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(queue) = inner.queues.get_mut(&kind) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|e| &e.user_id != user);
        queue.len() != before
    }

    async fn requeue_front(&self, kind: GameKind, entries: Vec<QueueEntry>) {
        if entries.is_empty() {
            return;
        }
        let mut inner = self.inner.lock().await;
        let queue = inner.queues.entry(kind).or_default();
        for entry in entries.into_iter().rev() {
            queue.push_front(entry);
        }
    }

    async fn insert_session(&self, session: Session) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.sessions.contains_key(&session.room_id) {
            return Err(StoreError::DuplicateRoom(session.room_id));
        }
        for player in &session.players {
            inner
                .user_rooms
                .insert(player.user_id.clone(), session.room_id.clone());
        }
        tracing::debug!(room_id = %session.room_id, "session stored");
        inner.sessions.insert(session.room_id.clone(), session);
        Ok(())
    }

    async fn session(&self, room: &RoomId) -> Option<Session> {
        let inner = self.inner.lock().await;
        inner.sessions.get(room).cloned()
    }

    async fn update_session(&self, session: Session) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.sessions.contains_key(&session.room_id) {
            return Err(StoreError::UnknownRoom(session.room_id));
        }
        inner.sessions.insert(session.room_id.clone(), session);
        Ok(())
    }

    async fn remove_session(&self, room: &RoomId) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.sessions.remove(room).is_some();
        if removed {
            tracing::debug!(room_id = %room, "session removed");
        }
        removed
    }

    async fn user_room(&self, user: &UserId) -> Option<RoomId> {
        let inner = self.inner.lock().await;
        inner.user_rooms.get(user).cloned()
    }

    async fn clear_user_room_if(&self, user: &UserId, room: &RoomId) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.user_rooms.get(user) == Some(room) {
            inner.user_rooms.remove(user);
            true
        } else {
            false
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use parlor_protocol::{GameState, PlayerSeat, SessionStatus};

    use super::*;
    use crate::unix_millis;

    const KIND: GameKind = GameKind::TicTacToe;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    fn entry(user: &str) -> QueueEntry {
        QueueEntry::new(uid(user), user.to_uppercase())
    }

    fn session(room: &str, users: [&str; 2]) -> Session {
        Session {
            room_id: RoomId::from(room),
            game: KIND,
            players: users
                .iter()
                .map(|u| PlayerSeat {
                    user_id: uid(u),
                    display_name: u.to_uppercase(),
                })
                .collect(),
            state: GameState(serde_json::json!({})),
            status: SessionStatus::Active,
            outcome: None,
            created_at: unix_millis(),
        }
    }

    // =====================================================================
    // Queue
    // =====================================================================

    #[tokio::test]
    async fn test_enqueue_dequeue_preserves_fifo_order() {
        let store = MemoryStore::new();
        store.enqueue(KIND, entry("a")).await;
        store.enqueue(KIND, entry("b")).await;
        store.enqueue(KIND, entry("c")).await;

        let popped = store.dequeue_up_to(KIND, 2).await;
        let ids: Vec<_> = popped.iter().map(|e| e.user_id.clone()).collect();
        assert_eq!(ids, vec![uid("a"), uid("b")]);
        assert_eq!(store.queue_len(KIND).await, 1);
    }

    #[tokio::test]
    async fn test_enqueue_same_user_replaces_old_entry() {
        let store = MemoryStore::new();
        store.enqueue(KIND, entry("a")).await;
        store.enqueue(KIND, entry("b")).await;
        store.enqueue(KIND, entry("a")).await;

        assert_eq!(store.queue_len(KIND).await, 2);
        // The re-enqueued user moved behind `b`.
        let popped = store.dequeue_up_to(KIND, 2).await;
        let ids: Vec<_> = popped.iter().map(|e| e.user_id.clone()).collect();
        assert_eq!(ids, vec![uid("b"), uid("a")]);
    }

    #[tokio::test]
    async fn test_dequeue_up_to_returns_short_when_queue_small() {
        let store = MemoryStore::new();
        store.enqueue(KIND, entry("a")).await;

        let popped = store.dequeue_up_to(KIND, 2).await;
        assert_eq!(popped.len(), 1);
        assert_eq!(store.queue_len(KIND).await, 0);
        assert!(store.dequeue_up_to(KIND, 2).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_entry_duplicated_or_lost_across_operations() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c", "d", "e"] {
            store.enqueue(KIND, entry(name)).await;
        }
        let first = store.dequeue_up_to(KIND, 2).await;
        let second = store.dequeue_up_to(KIND, 2).await;
        let third = store.dequeue_up_to(KIND, 2).await;

        let mut all: Vec<_> = first
            .iter()
            .chain(&second)
            .chain(&third)
            .map(|e| e.user_id.0.clone())
            .collect();
        all.sort();
        assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_remove_queued_reports_presence() {
        let store = MemoryStore::new();
        store.enqueue(KIND, entry("a")).await;

        assert!(store.remove_queued(KIND, &uid("a")).await);
        assert!(!store.remove_queued(KIND, &uid("a")).await);
        assert_eq!(store.queue_len(KIND).await, 0);
    }

    #[tokio::test]
    async fn test_queued_tracks_membership() {
        let store = MemoryStore::new();
        assert!(!store.queued(KIND, &uid("a")).await);

        store.enqueue(KIND, entry("a")).await;
        assert!(store.queued(KIND, &uid("a")).await);

        store.dequeue_up_to(KIND, 1).await;
        assert!(!store.queued(KIND, &uid("a")).await);
    }

    #[tokio::test]
    async fn test_requeue_front_restores_order_and_joined_at() {
        let store = MemoryStore::new();
        store.enqueue(KIND, entry("a")).await;
        store.enqueue(KIND, entry("b")).await;
        store.enqueue(KIND, entry("c")).await;

        let popped = store.dequeue_up_to(KIND, 2).await;
        let stamps: Vec<u64> = popped.iter().map(|e| e.joined_at).collect();
        store.requeue_front(KIND, popped).await;

        let restored = store.dequeue_up_to(KIND, 3).await;
        let ids: Vec<_> = restored.iter().map(|e| e.user_id.clone()).collect();
        assert_eq!(ids, vec![uid("a"), uid("b"), uid("c")]);
        assert_eq!(restored[0].joined_at, stamps[0]);
        assert_eq!(restored[1].joined_at, stamps[1]);
    }

    #[tokio::test]
    async fn test_queues_are_scoped_per_game_kind() {
        let store = MemoryStore::new();
        store.enqueue(GameKind::TicTacToe, entry("a")).await;
        store.enqueue(GameKind::ConnectFour, entry("b")).await;

        assert_eq!(store.queue_len(GameKind::TicTacToe).await, 1);
        assert_eq!(store.queue_len(GameKind::ConnectFour).await, 1);
        assert!(!store.remove_queued(GameKind::ConnectFour, &uid("a")).await);
    }

    // =====================================================================
    // Sessions and index
    // =====================================================================

    #[tokio::test]
    async fn test_insert_session_sets_both_index_entries() {
        let store = MemoryStore::new();
        let s = session("tictactoe-0000000000000001", ["a", "b"]);
        store.insert_session(s.clone()).await.unwrap();

        assert_eq!(store.session(&s.room_id).await, Some(s.clone()));
        assert_eq!(store.user_room(&uid("a")).await, Some(s.room_id.clone()));
        assert_eq!(store.user_room(&uid("b")).await, Some(s.room_id));
    }

    #[tokio::test]
    async fn test_insert_duplicate_room_is_rejected() {
        let store = MemoryStore::new();
        let s = session("tictactoe-0000000000000001", ["a", "b"]);
        store.insert_session(s.clone()).await.unwrap();

        let result = store.insert_session(s).await;
        assert!(matches!(result, Err(StoreError::DuplicateRoom(_))));
    }

    #[tokio::test]
    async fn test_update_session_requires_existing_room() {
        let store = MemoryStore::new();
        let s = session("tictactoe-0000000000000001", ["a", "b"]);

        let result = store.update_session(s.clone()).await;
        assert!(matches!(result, Err(StoreError::UnknownRoom(_))));

        store.insert_session(s.clone()).await.unwrap();
        let mut updated = s;
        updated.status = SessionStatus::Finished;
        store.update_session(updated.clone()).await.unwrap();
        assert_eq!(
            store.session(&updated.room_id).await.unwrap().status,
            SessionStatus::Finished
        );
    }

    #[tokio::test]
    async fn test_remove_session_is_idempotent() {
        let store = MemoryStore::new();
        let s = session("tictactoe-0000000000000001", ["a", "b"]);
        store.insert_session(s.clone()).await.unwrap();

        assert!(store.remove_session(&s.room_id).await);
        assert!(!store.remove_session(&s.room_id).await);
        assert_eq!(store.session(&s.room_id).await, None);
    }

    #[tokio::test]
    async fn test_clear_user_room_if_only_matches_same_room() {
        let store = MemoryStore::new();
        let s = session("tictactoe-0000000000000001", ["a", "b"]);
        store.insert_session(s.clone()).await.unwrap();

        let other = RoomId::from("tictactoe-00000000000000ff");
        assert!(!store.clear_user_room_if(&uid("a"), &other).await);
        assert_eq!(store.user_room(&uid("a")).await, Some(s.room_id.clone()));

        assert!(store.clear_user_room_if(&uid("a"), &s.room_id).await);
        assert_eq!(store.user_room(&uid("a")).await, None);
        // `b` is untouched.
        assert_eq!(store.user_room(&uid("b")).await, Some(s.room_id));
    }
}
