//! The engine: matchmaking, move coordination, and reclaim.
//!
//! One [`Engine`] is shared by every request handler in the process. It
//! is cheap to clone (an `Arc` around the shared state) and every method
//! is safe under arbitrary concurrency: the store serializes queue and
//! session operations, a per-room lock serializes move application, and
//! the residency tracker makes reclaim single-winner.

use std::collections::HashMap;
use std::sync::Arc;

use parlor_protocol::{
    GameInfo, GameKind, MatchStatus, MoveInput, Outcome, PlayerSeat, RoomId,
    RuleViolation, Session, SessionStatus, UserId,
};
use parlor_rules::rules_for;
use parlor_store::{MatchStore, QueueEntry, unix_millis};
use parlor_timer::Timers;
use rand::Rng;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::residency::{AckOutcome, ResidencyTracker};
use crate::{EngineConfig, EngineError, StatsSink};

/// What a matchmaking request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchTicket {
    /// The caller is seated in this room (freshly formed, or their
    /// existing live match).
    Matched { room_id: RoomId },
    /// The caller is queued; a later poll will observe the match.
    Waiting,
}

struct Inner<S, T> {
    store: S,
    stats: T,
    config: EngineConfig,
    residency: ResidencyTracker,
    /// Cleanup countdowns, one per finished room.
    timers: Timers<RoomId>,
    /// Per-room move serialization. Entries live as long as the room.
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

/// The matchmaking and session coordinator.
pub struct Engine<S, T> {
    inner: Arc<Inner<S, T>>,
}

impl<S, T> Clone for Engine<S, T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: MatchStore, T: StatsSink> Engine<S, T> {
    /// Creates an engine over the given store and stats sink.
    pub fn new(store: S, stats: T, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                stats,
                config,
                residency: ResidencyTracker::default(),
                timers: Timers::new(),
                room_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Lists the registered game kinds with their player counts.
    pub fn list_games(&self) -> Vec<GameInfo> {
        GameKind::ALL
            .iter()
            .map(|&game| {
                let rules = rules_for(game);
                GameInfo {
                    game,
                    min_players: rules.min_players(),
                    max_players: rules.max_players(),
                }
            })
            .collect()
    }

    // -----------------------------------------------------------------
    // Matchmaking
    // -----------------------------------------------------------------

    /// Queues a player for a match, forming one immediately when enough
    /// players are waiting.
    ///
    /// Safe under retry: a repeated request supersedes the caller's
    /// stale queue entry, and once matched it keeps resolving to the
    /// same room until that match concludes.
    pub async fn request_match(
        &self,
        kind: GameKind,
        user: UserId,
        display_name: String,
    ) -> Result<MatchTicket, EngineError> {
        let store = &self.inner.store;

        // A fresh request supersedes any stale queue entry.
        store.remove_queued(kind, &user).await;

        // Reconnection guard: an index entry pointing at a live match
        // answers the request without queueing a duplicate.
        if let Some(session) = self.resolve_index(&user).await {
            if session.status == SessionStatus::Active {
                tracing::debug!(
                    user_id = %user,
                    room_id = %session.room_id,
                    "request resolves to existing match"
                );
                return Ok(MatchTicket::Matched { room_id: session.room_id });
            }
            // Finished but still on the result screen: the old room
            // stays viewable while the user queues for a new match.
        }

        store
            .enqueue(kind, QueueEntry::new(user.clone(), display_name))
            .await;

        let needed = rules_for(kind).min_players();
        if store.queue_len(kind).await >= needed {
            let popped = store.dequeue_up_to(kind, needed).await;
            if popped.len() == needed {
                let session = open_session(kind, &popped);
                let room_id = session.room_id.clone();
                store.insert_session(session).await?;
                tracing::info!(
                    %room_id,
                    game = %kind,
                    players = needed,
                    "match formed"
                );
                if popped.iter().any(|e| e.user_id == user) {
                    return Ok(MatchTicket::Matched { room_id });
                }
                // The popped pair didn't include the caller; they stay
                // queued and observe their own match on a later poll.
                return Ok(MatchTicket::Waiting);
            }
            // A concurrent pop raced us below the threshold. Restore
            // FIFO order; nobody was matched.
            store.requeue_front(kind, popped).await;
        }

        Ok(MatchTicket::Waiting)
    }

    /// Removes a player from the queue.
    ///
    /// Returns whether an entry was removed. `false` means the player
    /// was no longer queued — either never enqueued, or already popped
    /// into a match (cancellation does not un-match; the queue's
    /// serialization decides which side won).
    pub async fn cancel_matchmaking(&self, kind: GameKind, user: &UserId) -> bool {
        let removed = self.inner.store.remove_queued(kind, user).await;
        if removed {
            tracing::info!(user_id = %user, game = %kind, "matchmaking cancelled");
        }
        removed
    }

    /// Resolves what a user's matchmaking request has come to.
    pub async fn poll_match_status(
        &self,
        kind: GameKind,
        user: &UserId,
    ) -> MatchStatus {
        if let Some(session) = self.resolve_index(user).await {
            return MatchStatus::Matched { room_id: session.room_id };
        }
        if self.inner.store.queued(kind, user).await {
            MatchStatus::Queued
        } else {
            MatchStatus::Idle
        }
    }

    // -----------------------------------------------------------------
    // Sessions and moves
    // -----------------------------------------------------------------

    /// Fetches a session snapshot.
    pub async fn get_session(&self, room: &RoomId) -> Result<Session, EngineError> {
        self.inner
            .store
            .session(room)
            .await
            .ok_or_else(|| EngineError::NotFound(room.clone()))
    }

    /// Validates and applies one move, finishing the match when the
    /// move decides it.
    pub async fn submit_move(
        &self,
        room: &RoomId,
        user: &UserId,
        input: &MoveInput,
    ) -> Result<Session, EngineError> {
        // Serialize read-validate-apply-persist per room so concurrent
        // moves can't both act on the same pre-move state.
        let _guard = self.room_lock(room).await;

        let session = self.get_session(room).await?;
        if !session.has_player(user) {
            return Err(EngineError::Conflict(format!(
                "user {user} is not seated in room {room}"
            )));
        }
        // A forfeited session is finished without an outcome embedded
        // in its game state; the status check can't be left to the rules.
        if session.status == SessionStatus::Finished {
            return Err(EngineError::Rejected(RuleViolation::GameFinished));
        }

        let rules = rules_for(session.game);
        rules.validate_move(&session.state, user, input)?;
        let state = rules.apply_move(&session.state, user, input)?;
        let end = rules.check_end(&state)?;

        let mut updated = session;
        updated.state = state;
        if end.finished {
            updated.status = SessionStatus::Finished;
            updated.outcome = Some(Outcome {
                winner: end.winner,
                is_draw: end.is_draw,
            });
        }
        self.inner.store.update_session(updated.clone()).await?;

        if end.finished {
            self.finish_session(&updated).await;
        }
        Ok(updated)
    }

    /// Forfeits an active match: the opponent wins regardless of board
    /// state. Leaving an already-finished match is a no-op.
    pub async fn leave_match(
        &self,
        room: &RoomId,
        user: &UserId,
    ) -> Result<Session, EngineError> {
        let _guard = self.room_lock(room).await;

        let session = self.get_session(room).await?;
        if !session.has_player(user) {
            return Err(EngineError::Conflict(format!(
                "user {user} is not seated in room {room}"
            )));
        }
        if session.status == SessionStatus::Finished {
            return Ok(session);
        }

        let winner = session
            .opponent_of(user)
            .map(|seat| seat.user_id.clone())
            .ok_or_else(|| EngineError::Internal("no opponent seated".into()))?;

        let mut updated = session;
        updated.status = SessionStatus::Finished;
        updated.outcome = Some(Outcome::win(winner));
        self.inner.store.update_session(updated.clone()).await?;

        tracing::info!(room_id = %room, user_id = %user, "match forfeited");
        self.finish_session(&updated).await;
        Ok(updated)
    }

    // -----------------------------------------------------------------
    // Result phase and reclaim
    // -----------------------------------------------------------------

    /// Acknowledges that a player has left the result screen.
    ///
    /// The player's index entry is released; when the last viewer
    /// leaves, the room is reclaimed immediately. Retry-safe: an
    /// unknown or already-reclaimed room is a no-op.
    pub async fn leave_result(&self, room: &RoomId, user: &UserId) {
        match self.inner.residency.acknowledge(room, user).await {
            AckOutcome::NotTracked => {}
            AckOutcome::StillViewing => {
                self.inner.store.clear_user_room_if(user, room).await;
            }
            AckOutcome::Emptied => {
                self.inner.store.clear_user_room_if(user, room).await;
                tracing::info!(
                    room_id = %room,
                    "all players acknowledged, reclaiming"
                );
                self.reclaim(room).await;
            }
        }
    }

    /// Enters the result phase for a freshly finished session: records
    /// the outcome (best-effort, detached) and starts the reclaim
    /// countdown. A room enters at most once; retries are absorbed.
    async fn finish_session(&self, session: &Session) {
        let room = session.room_id.clone();
        if !self
            .inner
            .residency
            .begin(room.clone(), session.player_ids())
            .await
        {
            return;
        }

        if let Some(outcome) = session.outcome.clone() {
            let players = session.player_ids();
            let engine = self.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    engine.inner.stats.record_outcome(&players, &outcome).await
                {
                    tracing::warn!(error = %e, "outcome not recorded");
                }
            });
        }

        let engine = self.clone();
        let timer_room = room.clone();
        self.inner.timers.schedule(
            room.clone(),
            self.inner.config.reclaim_timeout,
            move || async move { engine.reclaim_expired(timer_room).await },
        );
        tracing::info!(
            room_id = %room,
            "match finished, awaiting result acknowledgements"
        );
    }

    /// Timer path: claims the room if its result is still being viewed,
    /// then reclaims. A timer that lost the race to an explicit reclaim
    /// finds nothing to claim and no-ops.
    async fn reclaim_expired(&self, room: RoomId) {
        if self.inner.residency.take(&room).await.is_none() {
            return;
        }
        tracing::info!(room_id = %room, "result window elapsed, reclaiming");
        self.reclaim(&room).await;
    }

    /// Deletes a reclaimed room: its session, its players' index
    /// entries (when they still point here), and any stray queue
    /// entries. Runs once per room — the residency tracker guarantees a
    /// single claimant.
    async fn reclaim(&self, room: &RoomId) {
        let store = &self.inner.store;
        if let Some(session) = store.session(room).await {
            for seat in &session.players {
                store.clear_user_room_if(&seat.user_id, room).await;
                // A player could still be queued from an abandoned flow.
                store.remove_queued(session.game, &seat.user_id).await;
            }
            store.remove_session(room).await;
        }
        self.inner.timers.cancel(room);
        self.inner.room_locks.lock().await.remove(room);
        tracing::debug!(room_id = %room, "room reclaimed");
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Validates a user's index entry, purging it when stale.
    ///
    /// A dangling entry (no session behind it) or an entry pointing at
    /// a finished match whose result screen is no longer tracked gets
    /// deleted; otherwise the index is authoritative.
    async fn resolve_index(&self, user: &UserId) -> Option<Session> {
        let store = &self.inner.store;
        let room = store.user_room(user).await?;
        let Some(session) = store.session(&room).await else {
            tracing::debug!(
                user_id = %user,
                room_id = %room,
                "purging dangling index entry"
            );
            store.clear_user_room_if(user, &room).await;
            return None;
        };
        if session.status == SessionStatus::Finished
            && !self.inner.residency.is_tracked(&room).await
        {
            // Fully concluded and already reclaimable; the entry only
            // lingers because this user never acknowledged.
            tracing::debug!(
                user_id = %user,
                room_id = %room,
                "purging stale index entry"
            );
            store.clear_user_room_if(user, &room).await;
            return None;
        }
        Some(session)
    }

    /// Acquires the per-room move lock, creating it on first use.
    async fn room_lock(&self, room: &RoomId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.room_locks.lock().await;
            Arc::clone(locks.entry(room.clone()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Builds the session for a freshly matched pair. Seat order is dequeue
/// order, so the longest-waiting player moves first.
fn open_session(kind: GameKind, entries: &[QueueEntry]) -> Session {
    let players: Vec<PlayerSeat> = entries
        .iter()
        .map(|e| PlayerSeat {
            user_id: e.user_id.clone(),
            display_name: e.display_name.clone(),
        })
        .collect();
    let ids: Vec<UserId> = entries.iter().map(|e| e.user_id.clone()).collect();
    Session {
        room_id: generate_room_id(kind),
        game: kind,
        players,
        state: rules_for(kind).create_initial_state(&ids),
        status: SessionStatus::Active,
        outcome: None,
        created_at: unix_millis(),
    }
}

/// Generates `<game key>-<16 hex chars>`: 64 random bits, unique in
/// practice for ids that live only as long as a session.
fn generate_room_id(kind: GameKind) -> RoomId {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    RoomId(format!("{}-{suffix}", kind.key()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_room_id_encodes_its_kind() {
        let id = generate_room_id(GameKind::ConnectFour);
        assert_eq!(id.kind(), Some(GameKind::ConnectFour));
        // key + '-' + 16 hex chars
        assert_eq!(id.0.len(), "connectfour".len() + 1 + 16);
    }

    #[test]
    fn test_generated_room_ids_are_unique() {
        let a = generate_room_id(GameKind::TicTacToe);
        let b = generate_room_id(GameKind::TicTacToe);
        assert_ne!(a, b);
    }
}
