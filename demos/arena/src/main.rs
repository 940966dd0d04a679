//! A runnable Parlor server exposing the built-in game variants over
//! WebSocket, with outcomes logged instead of persisted.

use parlor::prelude::*;

/// Logs match outcomes. A production deployment would implement
/// `StatsSink` against its profile database instead.
struct LoggingStats;

impl StatsSink for LoggingStats {
    async fn record_outcome(
        &self,
        players: &[UserId],
        outcome: &Outcome,
    ) -> Result<(), StatsError> {
        tracing::info!(
            ?players,
            winner = ?outcome.winner,
            draw = outcome.is_draw,
            "match outcome"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    eprintln!("starting arena server on 0.0.0.0:8080");

    let server = ParlorServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build(MemoryStore::new(), LoggingStats)
        .await?;

    server.run().await?;
    Ok(())
}
