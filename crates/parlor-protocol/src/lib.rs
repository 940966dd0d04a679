//! Wire protocol for Parlor.
//!
//! This crate defines the "language" clients and the engine speak:
//!
//! - **Types** ([`RequestFrame`], [`Request`], [`Reply`], [`Session`],
//!   the identity newtypes) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer knows nothing about connections, queues, or rule
//! engines — it only defines shapes and their serialization.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ErrorCode, GameInfo, GameKind, GameState, MatchStatus, MoveInput, Outcome,
    PlayerSeat, Reply, ReplyFrame, Request, RequestFrame, RoomId, RuleViolation,
    Session, SessionStatus, UserId,
};
