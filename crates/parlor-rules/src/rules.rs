//! The `GameRules` trait and the kind → rules registry.
//!
//! This is the extension seam for game variants. The coordinators call
//! these five operations at the right times; a variant just implements
//! board rules. The trait is object-safe on purpose: the engine hosts
//! several variants at runtime and dispatches through [`rules_for`], so
//! adding a game is a new implementation plus one registry arm.

use parlor_protocol::{GameKind, GameState, MoveInput, UserId};

use crate::{ConnectFourRules, RulesError, TicTacToeRules};

/// The verdict of [`GameRules::check_end`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndState {
    /// Whether the game has a decided outcome.
    pub finished: bool,
    /// The winning player, if any.
    pub winner: Option<UserId>,
    /// Whether the game ended with no winner.
    pub is_draw: bool,
}

impl EndState {
    /// An undecided game.
    pub fn open() -> Self {
        Self { finished: false, winner: None, is_draw: false }
    }
}

/// The operations every game variant implements.
///
/// All methods are pure with respect to the passed state: `validate_move`
/// and `check_end` never mutate, and `apply_move` returns a fresh state
/// rather than editing in place. The state value itself is opaque to
/// callers — only the implementing variant knows its shape.
pub trait GameRules: Send + Sync {
    /// Minimum players needed to form a match.
    fn min_players(&self) -> usize;

    /// Maximum players a match can seat.
    fn max_players(&self) -> usize;

    /// Creates the initial state for a freshly formed match.
    ///
    /// Deterministic: the first player in `players` moves first.
    fn create_initial_state(&self, players: &[UserId]) -> GameState;

    /// Checks whether `user` may play `input` on `state`.
    ///
    /// Rejects decided games, out-of-turn moves, and occupied or
    /// out-of-range targets. Must not mutate `state`.
    fn validate_move(
        &self,
        state: &GameState,
        user: &UserId,
        input: &MoveInput,
    ) -> Result<(), RulesError>;

    /// Applies a validated move, returning the successor state.
    ///
    /// Advances the turn and, when the move decides the game, embeds the
    /// terminal outcome in the same transition — callers never need a
    /// second operation to learn the outcome of the move that ended it.
    fn apply_move(
        &self,
        state: &GameState,
        user: &UserId,
        input: &MoveInput,
    ) -> Result<GameState, RulesError>;

    /// Reports whether `state` is decided. Idempotent, and always agrees
    /// with any outcome embedded by `apply_move`.
    fn check_end(&self, state: &GameState) -> Result<EndState, RulesError>;
}

/// Registry instance for the three-in-a-row grid.
static TIC_TAC_TOE: TicTacToeRules = TicTacToeRules;
/// Registry instance for the four-in-a-row drop grid.
static CONNECT_FOUR: ConnectFourRules = ConnectFourRules;

/// Resolves a game kind to its rule engine.
pub fn rules_for(kind: GameKind) -> &'static dyn GameRules {
    match kind {
        GameKind::TicTacToe => &TIC_TAC_TOE,
        GameKind::ConnectFour => &CONNECT_FOUR,
    }
}
