//! Error types for the engine layer.

use parlor_protocol::{ErrorCode, RoomId, RuleViolation};
use parlor_rules::RulesError;
use parlor_store::StoreError;

/// Typed rejections surfaced to callers.
///
/// Dependency failures (the stats sink) never appear here — they are
/// swallowed and logged at the call site, per the best-effort contract.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No session exists for this room.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The move payload doesn't parse as the game's input shape.
    #[error("invalid move payload: {0}")]
    InvalidInput(String),

    /// The rules rejected the move; the reason is surfaced verbatim.
    #[error("move rejected: {0}")]
    Rejected(RuleViolation),

    /// The operation conflicts with the room's membership or state,
    /// e.g. a move from a user who isn't seated in the room.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A server-side invariant broke (corrupt stored state, a failed
    /// persist). Logged; callers see a generic code.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// The stable wire code for this rejection.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::Rejected(v) => ErrorCode::from(*v),
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<RulesError> for EngineError {
    fn from(e: RulesError) -> Self {
        match e {
            RulesError::Violation(v) => Self::Rejected(v),
            RulesError::Malformed(msg) => Self::InvalidInput(msg),
            RulesError::CorruptState(msg) => Self::Internal(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        Self::Internal(e.to_string())
    }
}
