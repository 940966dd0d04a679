//! Error types for the rules layer.

use parlor_protocol::RuleViolation;

/// Errors a rule engine can produce.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// The move is well-formed but illegal right now (wrong turn,
    /// occupied cell, decided game, out-of-range target).
    #[error("move rejected: {0}")]
    Violation(RuleViolation),

    /// The move payload doesn't parse as this game's input shape.
    #[error("malformed move payload: {0}")]
    Malformed(String),

    /// A stored game state doesn't parse as this game's state shape.
    /// Only possible if storage was corrupted or states were mixed up
    /// across game kinds.
    #[error("corrupt game state: {0}")]
    CorruptState(String),
}

impl From<RuleViolation> for RulesError {
    fn from(v: RuleViolation) -> Self {
        Self::Violation(v)
    }
}
