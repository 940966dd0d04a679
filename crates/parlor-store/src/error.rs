//! Error types for the storage layer.

use parlor_protocol::RoomId;

/// Errors that can occur during session persistence.
///
/// Queue operations are total (an absent entry is a `false`/empty
/// return, not an error); only session writes can violate invariants.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A session with this room id already exists.
    #[error("room {0} already exists")]
    DuplicateRoom(RoomId),

    /// No session with this room id exists.
    #[error("room {0} not found in store")]
    UnknownRoom(RoomId),
}
