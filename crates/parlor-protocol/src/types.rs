//! Core protocol types for Parlor's wire format.
//!
//! Everything a client and the engine exchange is defined here: identity
//! types, game-kind keys, session snapshots, and the request/reply frames
//! that travel on the wire. The shapes are locked down by the JSON tests
//! at the bottom of this file — a mismatch means client SDKs can't parse
//! our replies.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Players are anonymous: the client picks an opaque id string and sends
/// it with every request. The newtype keeps user ids from being confused
/// with room ids or display names in signatures.
///
/// `#[serde(transparent)]` serializes this as the bare string, so
/// `UserId("u-17")` is just `"u-17"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A unique identifier for a match (one game instance between two players).
///
/// A room id is `<game key>-<16 hex chars>`, e.g. `tictactoe-9f2ab14c03d7e851`.
/// Embedding the game key means a bare room id can always be resolved back
/// to the rule engine that owns its state — see [`RoomId::kind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// The game kind encoded in this room id, if the prefix is a known key.
    pub fn kind(&self) -> Option<GameKind> {
        let (prefix, _) = self.0.split_once('-')?;
        GameKind::from_key(prefix)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Game kinds
// ---------------------------------------------------------------------------

/// The registered game variants.
///
/// Each kind maps to one rule-engine implementation. Adding a variant is
/// a registration change (a new enum case plus a registry arm), not an
/// engine change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    /// 3×3 grid, three in a row wins.
    TicTacToe,
    /// 6×7 drop grid, four in a row wins.
    ConnectFour,
}

impl GameKind {
    /// All registered kinds, in listing order.
    pub const ALL: [GameKind; 2] = [GameKind::TicTacToe, GameKind::ConnectFour];

    /// The stable string key used in room ids and listings.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TicTacToe => "tictactoe",
            Self::ConnectFour => "connectfour",
        }
    }

    /// Resolves a key back to its kind.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Game state and moves (opaque to everything but the rules)
// ---------------------------------------------------------------------------

/// A game's full state, owned exclusively by its rule engine.
///
/// The engine stores and forwards this value but never inspects it; only
/// the matching [`GameKind`]'s rules know its shape. Keeping it as a JSON
/// value (rather than bytes) means clients can render the board straight
/// from a session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState(pub serde_json::Value);

/// A move payload, opaque to the core.
///
/// The rule engine for the session's game kind parses and validates it;
/// a payload it cannot parse is rejected as invalid input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveInput(pub serde_json::Value);

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// One player's seat in a session, in turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeat {
    /// The player's id.
    pub user_id: UserId,
    /// The name shown to the opponent.
    pub display_name: String,
}

/// Lifecycle status of a session.
///
/// `Active` sessions accept moves; `Finished` sessions are write-once
/// until they are reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Finished,
}

/// The decided result of a finished match.
///
/// `winner: None` with `is_draw: true` is a draw; `winner: Some` is a
/// win (natural or by forfeit). Stored on the session because a forfeit
/// decides the match without the rule engine embedding anything in the
/// game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Option<UserId>,
    pub is_draw: bool,
}

impl Outcome {
    /// A win for the given player.
    pub fn win(winner: UserId) -> Self {
        Self { winner: Some(winner), is_draw: false }
    }

    /// A draw.
    pub fn draw() -> Self {
        Self { winner: None, is_draw: true }
    }
}

/// The authoritative record of one match.
///
/// Created exactly once by matchmaking, mutated only by move submission
/// (and the forfeit path) until `status` becomes `Finished`, then
/// write-once until cleanup deletes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Globally unique, encodes the game kind (see [`RoomId`]).
    pub room_id: RoomId,
    /// Which rule engine owns `state`.
    pub game: GameKind,
    /// Seats in turn order — the first seat moves first.
    pub players: Vec<PlayerSeat>,
    /// Opaque game state, owned by the rules for `game`.
    pub state: GameState,
    /// Active or finished.
    pub status: SessionStatus,
    /// Set when the match is decided; `None` while active.
    pub outcome: Option<Outcome>,
    /// Unix milliseconds at creation.
    pub created_at: u64,
}

impl Session {
    /// Whether the given user is seated in this session.
    pub fn has_player(&self, user: &UserId) -> bool {
        self.players.iter().any(|p| &p.user_id == user)
    }

    /// The seat opposite the given user (two-player sessions).
    pub fn opponent_of(&self, user: &UserId) -> Option<&PlayerSeat> {
        self.players.iter().find(|p| &p.user_id != user)
    }

    /// Ids of all seated players, in turn order.
    pub fn player_ids(&self) -> Vec<UserId> {
        self.players.iter().map(|p| p.user_id.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Error codes and rule violations
// ---------------------------------------------------------------------------

/// Why a rule engine rejected a move.
///
/// These are surfaced to the caller verbatim as reply error codes, so
/// the variant names are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleViolation {
    /// It is the other player's turn.
    NotYourTurn,
    /// The targeted cell already holds a marker.
    CellOccupied,
    /// The targeted column has no free row left.
    ColumnFull,
    /// The game already has a decided outcome.
    GameFinished,
    /// The move targets a location outside the board.
    InvalidTarget,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotYourTurn => "NotYourTurn",
            Self::CellOccupied => "CellOccupied",
            Self::ColumnFull => "ColumnFull",
            Self::GameFinished => "GameFinished",
            Self::InvalidTarget => "InvalidTarget",
        };
        f.write_str(s)
    }
}

/// Stable reason codes carried by [`Reply::Error`].
///
/// Rule violations keep their own codes so clients can branch on them
/// without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    NotFound,
    InvalidInput,
    NotYourTurn,
    CellOccupied,
    ColumnFull,
    GameFinished,
    InvalidTarget,
    Conflict,
    Internal,
}

impl From<RuleViolation> for ErrorCode {
    fn from(v: RuleViolation) -> Self {
        match v {
            RuleViolation::NotYourTurn => Self::NotYourTurn,
            RuleViolation::CellOccupied => Self::CellOccupied,
            RuleViolation::ColumnFull => Self::ColumnFull,
            RuleViolation::GameFinished => Self::GameFinished,
            RuleViolation::InvalidTarget => Self::InvalidTarget,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A listing entry returned by `ListGames`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    /// The game's key.
    pub game: GameKind,
    /// Minimum players to form a match.
    pub min_players: usize,
    /// Maximum players per match.
    pub max_players: usize,
}

/// Everything a client can ask the engine to do.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "RequestMatch", "game": "tictactoe", ... }` — the format
/// browser clients work with directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// List the registered game kinds.
    ListGames,

    /// Join the queue for a game, or learn about an existing match.
    RequestMatch {
        game: GameKind,
        user_id: UserId,
        display_name: String,
    },

    /// Leave the queue before being matched.
    CancelMatchmaking { game: GameKind, user_id: UserId },

    /// Ask whether a queued request has been matched yet.
    PollMatchStatus { game: GameKind, user_id: UserId },

    /// Fetch the current session snapshot for a room.
    GetSession { game: GameKind, room_id: RoomId },

    /// Submit a move into a room.
    SubmitMove {
        game: GameKind,
        room_id: RoomId,
        user_id: UserId,
        input: MoveInput,
    },

    /// Forfeit an active match.
    LeaveMatch {
        game: GameKind,
        room_id: RoomId,
        user_id: UserId,
    },

    /// Acknowledge the result screen of a finished match.
    LeaveResult {
        game: GameKind,
        room_id: RoomId,
        user_id: UserId,
    },
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Result of a matchmaking poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum MatchStatus {
    /// The user is seated in a live (or still-viewed) match.
    Matched { room_id: RoomId },
    /// The user is waiting in the queue.
    Queued,
    /// The user is neither queued nor matched.
    Idle,
}

/// Everything the engine can answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    /// Answer to `ListGames`.
    GameList { games: Vec<GameInfo> },

    /// Answer to `RequestMatch`. `room_id` is set iff `matched`.
    MatchTicket {
        matched: bool,
        room_id: Option<RoomId>,
    },

    /// Answer to `CancelMatchmaking`. `removed` is `false` when the
    /// user was no longer queued (already matched or never enqueued).
    Cancelled { removed: bool },

    /// Answer to `PollMatchStatus`.
    Status { status: MatchStatus },

    /// Answer to `GetSession` and `SubmitMove`.
    Session { session: Session },

    /// Answer to `LeaveMatch` and `LeaveResult`.
    Left,

    /// Any request that failed, with its stable reason code.
    Error { code: ErrorCode, message: String },
}

// ---------------------------------------------------------------------------
// Frames — request/reply correlation on the wire
// ---------------------------------------------------------------------------

/// A request as it travels on the wire.
///
/// `id` is a client-chosen correlation number echoed back in the matching
/// [`ReplyFrame`], so a client can pipeline requests over one connection.
/// `#[serde(flatten)]` merges the tagged request into the same JSON
/// object: `{ "id": 4, "type": "ListGames" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    #[serde(flatten)]
    pub request: Request,
}

/// A reply as it travels on the wire, correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyFrame {
    pub id: u64,
    #[serde(flatten)]
    pub reply: Reply,
}

// =========================================================================
// Tests
// =========================================================================
