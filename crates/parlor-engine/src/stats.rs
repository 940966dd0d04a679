//! The statistics collaborator seam.
//!
//! The engine doesn't own win/loss aggregation — a durable profile store
//! does. It is injected behind the [`StatsSink`] trait so production can
//! plug in its database client and tests can plug in a recorder. The
//! contract is best-effort: the engine fires the update in a detached
//! task, logs failures, and never lets them affect a move or forfeit
//! response.

use parlor_protocol::{Outcome, UserId};

/// Records the outcome of a finished match against durable player
/// profiles.
///
/// The implementation is expected to apply the update atomically across
/// the listed players (all increments or none). `players` is every seat
/// in the match, in turn order; losers are the players not named in
/// `outcome.winner` when the match isn't a draw.
pub trait StatsSink: Send + Sync + 'static {
    /// Applies one match outcome. Failures are logged by the engine and
    /// never surfaced to the player whose action finished the match.
    fn record_outcome(
        &self,
        players: &[UserId],
        outcome: &Outcome,
    ) -> impl std::future::Future<Output = Result<(), StatsError>> + Send;
}

/// Errors a stats sink can report.
///
/// These never propagate to engine callers; they exist so sinks can be
/// precise in logs.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// The profile store couldn't be reached.
    #[error("stats store unreachable: {0}")]
    Unreachable(String),

    /// The profile store refused the update.
    #[error("stats store rejected update: {0}")]
    Rejected(String),
}

/// A sink that discards every outcome. For demos and tests that don't
/// observe stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStats;

impl StatsSink for NoopStats {
    async fn record_outcome(
        &self,
        _players: &[UserId],
        _outcome: &Outcome,
    ) -> Result<(), StatsError> {
        Ok(())
    }
}
