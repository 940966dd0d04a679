//! The `MatchStore` trait — the storage seam of the engine.

use std::future::Future;

use parlor_protocol::{GameKind, RoomId, Session, UserId};

use crate::{QueueEntry, StoreError};

/// Storage for matchmaking queues, sessions, and the user → room index.
///
/// Every method is one atomic operation: no two concurrent calls observe
/// a half-applied state, `dequeue_up_to` never yields the same entry
/// twice, and `insert_session` writes the session plus both players'
/// index entries in a single step. Coordinators build their larger
/// protocols (match formation, reclaim) out of these primitives.
///
/// Methods are declared as explicit `Send` futures (rather than
/// `async fn`) because the engine's callers spawn work that awaits them
/// across task boundaries. Implementations can still use plain
/// `async fn`.
pub trait MatchStore: Send + Sync + 'static {
    // -- Queue operations -------------------------------------------------

    /// Adds a player to the back of a game's queue.
    ///
    /// If the user already has an entry for this game, the old entry is
    /// removed first — a fresh request supersedes a stale one.
    fn enqueue(
        &self,
        kind: GameKind,
        entry: QueueEntry,
    ) -> impl Future<Output = ()> + Send;

    /// Number of players waiting for this game.
    fn queue_len(&self, kind: GameKind) -> impl Future<Output = usize> + Send;

    /// Removes and returns up to `n` entries from the front of a game's
    /// queue, in FIFO order. Returns fewer (possibly zero) when the
    /// queue is shorter.
    fn dequeue_up_to(
        &self,
        kind: GameKind,
        n: usize,
    ) -> impl Future<Output = Vec<QueueEntry>> + Send;

    /// Whether a user currently has a queue entry for this game.
    fn queued(
        &self,
        kind: GameKind,
        user: &UserId,
    ) -> impl Future<Output = bool> + Send;

    /// Removes a user's queue entry. Returns whether one existed.
    fn remove_queued(
        &self,
        kind: GameKind,
        user: &UserId,
    ) -> impl Future<Output = bool> + Send;

    /// Puts partially popped entries back at the front of the queue, in
    /// their original order with their original `joined_at`, restoring
    /// FIFO fairness after an under-filled pop.
    fn requeue_front(
        &self,
        kind: GameKind,
        entries: Vec<QueueEntry>,
    ) -> impl Future<Output = ()> + Send;

    // -- Session operations -----------------------------------------------

    /// Persists a freshly created session AND the index entries of all
    /// its players, atomically.
    ///
    /// # Errors
    /// [`StoreError::DuplicateRoom`] if the room id is already taken.
    fn insert_session(
        &self,
        session: Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Looks up a session by room id.
    fn session(
        &self,
        room: &RoomId,
    ) -> impl Future<Output = Option<Session>> + Send;

    /// Replaces an existing session's record.
    ///
    /// # Errors
    /// [`StoreError::UnknownRoom`] if no session with this id exists.
    fn update_session(
        &self,
        session: Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes a session. Returns whether one existed. Index entries are
    /// not touched — reclaim deletes them per player via
    /// [`clear_user_room_if`](Self::clear_user_room_if).
    fn remove_session(
        &self,
        room: &RoomId,
    ) -> impl Future<Output = bool> + Send;

    // -- User → room index ------------------------------------------------

    /// The room a user is currently indexed into, if any.
    fn user_room(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Option<RoomId>> + Send;

    /// Deletes a user's index entry, but only if it still points at
    /// `room`. Returns whether an entry was deleted. The condition keeps
    /// the cleanup of an old room from dangling a user who has already
    /// been matched into a new one.
    fn clear_user_room_if(
        &self,
        user: &UserId,
        room: &RoomId,
    ) -> impl Future<Output = bool> + Send;
}

/// A shared store is still a store. Lets callers keep their own handle
/// to a store they hand to the engine.
impl<S: MatchStore> MatchStore for std::sync::Arc<S> {
    async fn enqueue(&self, kind: GameKind, entry: QueueEntry) {
        (**self).enqueue(kind, entry).await
    }

    async fn queue_len(&self, kind: GameKind) -> usize {
        (**self).queue_len(kind).await
    }

    async fn dequeue_up_to(&self, kind: GameKind, n: usize) -> Vec<QueueEntry> {
        (**self).dequeue_up_to(kind, n).await
    }

    async fn queued(&self, kind: GameKind, user: &UserId) -> bool {
        (**self).queued(kind, user).await
    }

    async fn remove_queued(&self, kind: GameKind, user: &UserId) -> bool {
        (**self).remove_queued(kind, user).await
    }

    async fn requeue_front(&self, kind: GameKind, entries: Vec<QueueEntry>) {
        (**self).requeue_front(kind, entries).await
    }

    async fn insert_session(&self, session: Session) -> Result<(), StoreError> {
        (**self).insert_session(session).await
    }

    async fn session(&self, room: &RoomId) -> Option<Session> {
        (**self).session(room).await
    }

    async fn update_session(&self, session: Session) -> Result<(), StoreError> {
        (**self).update_session(session).await
    }

    async fn remove_session(&self, room: &RoomId) -> bool {
        (**self).remove_session(room).await
    }

    async fn user_room(&self, user: &UserId) -> Option<RoomId> {
        (**self).user_room(user).await
    }

    async fn clear_user_room_if(&self, user: &UserId, room: &RoomId) -> bool {
        (**self).clear_user_room_if(user, room).await
    }
}
