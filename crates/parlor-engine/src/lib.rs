//! Matchmaking and session lifecycle for Parlor.
//!
//! The [`Engine`] is the authoritative coordinator: it pairs waiting
//! players into sessions, validates and applies moves through the rule
//! engine registered for each game kind, resolves reconnection lookups,
//! and reclaims finished matches once both players have seen the result
//! (or a timeout elapses).
//!
//! # Key types
//!
//! - [`Engine`] — the coordinator; cheap to clone, share one per process
//! - [`EngineConfig`] — tunables (result-screen reclaim timeout)
//! - [`StatsSink`] — the injected, best-effort outcome recorder
//! - [`MatchTicket`] — what a matchmaking request resolves to
//! - [`EngineError`] — typed rejections with stable reason codes

mod config;
mod engine;
mod error;
mod residency;
mod stats;

pub use config::EngineConfig;
pub use engine::{Engine, MatchTicket};
pub use error::EngineError;
pub use stats::{NoopStats, StatsError, StatsSink};
