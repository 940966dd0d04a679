//! Result residency: which players still need to see a finished match.
//!
//! A room enters the tracker the moment its match finishes and leaves it
//! exactly once — either when the last viewer acknowledges or when the
//! cleanup timer claims it. The tracker's mutex is what makes reclaim
//! single-winner: [`ResidencyTracker::take`] and the `Emptied` result of
//! [`ResidencyTracker::acknowledge`] both remove the entry, and whoever
//! removes it owns the deletes that follow.

use std::collections::{HashMap, HashSet};

use parlor_protocol::{RoomId, UserId};
use tokio::sync::Mutex;

/// What an acknowledgement did.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AckOutcome {
    /// The room isn't tracked — never finished here, or already
    /// reclaimed. Acknowledgements are retry-safe no-ops in this case.
    NotTracked,
    /// The player was removed (or had already been removed); someone is
    /// still viewing.
    StillViewing,
    /// The player was removed and the set emptied. The caller now owns
    /// the reclaim.
    Emptied,
}

/// Tracks the set of players still viewing each finished match.
#[derive(Default)]
pub(crate) struct ResidencyTracker {
    rooms: Mutex<HashMap<RoomId, HashSet<UserId>>>,
}

impl ResidencyTracker {
    /// Starts tracking a room with the given viewers.
    ///
    /// Returns `false` without touching anything if the room is already
    /// tracked — the guard against double-initializing the result phase
    /// from a retried request.
    pub(crate) async fn begin(
        &self,
        room: RoomId,
        viewers: impl IntoIterator<Item = UserId>,
    ) -> bool {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room) {
            return false;
        }
        rooms.insert(room, viewers.into_iter().collect());
        true
    }

    /// Removes a viewer from a room's set.
    pub(crate) async fn acknowledge(
        &self,
        room: &RoomId,
        user: &UserId,
    ) -> AckOutcome {
        let mut rooms = self.rooms.lock().await;
        let Some(viewers) = rooms.get_mut(room) else {
            return AckOutcome::NotTracked;
        };
        viewers.remove(user);
        if viewers.is_empty() {
            rooms.remove(room);
            AckOutcome::Emptied
        } else {
            AckOutcome::StillViewing
        }
    }

    /// Claims a tracked room for reclaim, removing it.
    ///
    /// Returns `None` if the room was already claimed — the loser of a
    /// timer-vs-acknowledgement race sees this and must no-op.
    pub(crate) async fn take(&self, room: &RoomId) -> Option<HashSet<UserId>> {
        self.rooms.lock().await.remove(room)
    }

    /// Whether the room is currently tracked (its result is still being
    /// viewed).
    pub(crate) async fn is_tracked(&self, room: &RoomId) -> bool {
        self.rooms.lock().await.contains_key(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    fn room() -> RoomId {
        RoomId::from("tictactoe-0000000000000001")
    }

    #[tokio::test]
    async fn test_begin_tracks_once() {
        let tracker = ResidencyTracker::default();
        assert!(tracker.begin(room(), [uid("a"), uid("b")]).await);
        assert!(!tracker.begin(room(), [uid("a"), uid("b")]).await);
        assert!(tracker.is_tracked(&room()).await);
    }

    #[tokio::test]
    async fn test_acknowledge_untracked_room_is_not_tracked() {
        let tracker = ResidencyTracker::default();
        assert_eq!(
            tracker.acknowledge(&room(), &uid("a")).await,
            AckOutcome::NotTracked
        );
    }

    #[tokio::test]
    async fn test_last_acknowledgement_empties() {
        let tracker = ResidencyTracker::default();
        tracker.begin(room(), [uid("a"), uid("b")]).await;

        assert_eq!(
            tracker.acknowledge(&room(), &uid("a")).await,
            AckOutcome::StillViewing
        );
        assert_eq!(
            tracker.acknowledge(&room(), &uid("b")).await,
            AckOutcome::Emptied
        );
        assert!(!tracker.is_tracked(&room()).await);
    }

    #[tokio::test]
    async fn test_repeat_acknowledgement_is_harmless() {
        let tracker = ResidencyTracker::default();
        tracker.begin(room(), [uid("a"), uid("b")]).await;

        tracker.acknowledge(&room(), &uid("a")).await;
        // Retried acknowledgement doesn't empty the set or error.
        assert_eq!(
            tracker.acknowledge(&room(), &uid("a")).await,
            AckOutcome::StillViewing
        );
    }

    #[tokio::test]
    async fn test_take_claims_exactly_once() {
        let tracker = ResidencyTracker::default();
        tracker.begin(room(), [uid("a"), uid("b")]).await;

        let viewers = tracker.take(&room()).await.expect("first claim wins");
        assert_eq!(viewers.len(), 2);
        assert!(tracker.take(&room()).await.is_none());
    }
}
