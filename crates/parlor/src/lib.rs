//! # Parlor
//!
//! Matchmaking and session server for short-lived two-player turn-based
//! games. Anonymous players queue per game kind, get paired into
//! sessions, submit moves against a pluggable rule engine, and finished
//! matches are reclaimed once both players have seen the result.
//!
//! This meta-crate ties the layers together: transport → protocol →
//! engine. Game rules live in `parlor-rules`, storage behind the
//! `MatchStore` trait in `parlor-store`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParlorError> {
//!     let server = ParlorServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build(MemoryStore::new(), NoopStats)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder};

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG`
/// (defaulting to `info`). Call once at binary startup.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// The commonly needed imports, in one place.
pub mod prelude {
    pub use parlor_engine::{
        Engine, EngineConfig, EngineError, MatchTicket, NoopStats, StatsError,
        StatsSink,
    };
    pub use parlor_protocol::{
        Codec, ErrorCode, GameInfo, GameKind, GameState, JsonCodec,
        MatchStatus, MoveInput, Outcome, PlayerSeat, Reply, ReplyFrame,
        Request, RequestFrame, RoomId, RuleViolation, Session, SessionStatus,
        UserId,
    };
    pub use parlor_rules::{EndState, GameRules, RulesError, rules_for};
    pub use parlor_store::{MatchStore, MemoryStore, QueueEntry};

    pub use crate::{ParlorError, ParlorServer, ParlorServerBuilder, init_tracing};
}
