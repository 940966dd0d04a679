//! Per-game rule engines for Parlor.
//!
//! Each game variant implements the [`GameRules`] trait over an opaque
//! [`GameState`](parlor_protocol::GameState): the matchmaking and move
//! coordinators never look inside a state value, they only pass it to the
//! rules registered for the session's [`GameKind`](parlor_protocol::GameKind).
//!
//! # Key types
//!
//! - [`GameRules`] — the trait a game variant implements
//! - [`rules_for`] — the registry mapping a kind to its rules
//! - [`EndState`] — the verdict returned by `check_end`
//! - [`RulesError`] — rejection reasons and payload errors

mod connectfour;
mod error;
mod rules;
mod tictactoe;

pub use connectfour::ConnectFourRules;
pub use error::RulesError;
pub use rules::{EndState, GameRules, rules_for};
pub use tictactoe::TicTacToeRules;
