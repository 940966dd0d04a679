//! Three-in-a-row rules: a 3×3 grid, cells addressed 0–8 row-major.
//!
//! The first seated player plays X and moves first. A move payload is
//! `{"cell": n}`. The winner check scans every row, column, and diagonal;
//! the first uniform line found decides the game.

use parlor_protocol::{GameState, MoveInput, RuleViolation, UserId};
use serde::{Deserialize, Serialize};

use crate::{EndState, GameRules, RulesError};

const CELLS: usize = 9;

/// Every winning line, as cell-index triples.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Mark {
    X,
    O,
}

/// The full board state as stored in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Board {
    cells: [Option<Mark>; 9],
    /// Seats in turn order; index 0 plays X.
    players: Vec<UserId>,
    /// Index into `players` of whoever moves next.
    turn: usize,
    winner: Option<UserId>,
    draw: bool,
}

impl Board {
    fn decided(&self) -> bool {
        self.winner.is_some() || self.draw
    }
}

#[derive(Debug, Deserialize)]
struct CellMove {
    cell: usize,
}

fn decode_board(state: &GameState) -> Result<Board, RulesError> {
    serde_json::from_value(state.0.clone())
        .map_err(|e| RulesError::CorruptState(e.to_string()))
}

fn encode_board(board: &Board) -> Result<GameState, RulesError> {
    serde_json::to_value(board)
        .map(GameState)
        .map_err(|e| RulesError::CorruptState(e.to_string()))
}

fn decode_move(input: &MoveInput) -> Result<CellMove, RulesError> {
    serde_json::from_value(input.0.clone())
        .map_err(|e| RulesError::Malformed(e.to_string()))
}

fn check(board: &Board, user: &UserId, mv: &CellMove) -> Result<(), RulesError> {
    if board.decided() {
        return Err(RuleViolation::GameFinished.into());
    }
    if board.players.get(board.turn) != Some(user) {
        return Err(RuleViolation::NotYourTurn.into());
    }
    if mv.cell >= CELLS {
        return Err(RuleViolation::InvalidTarget.into());
    }
    if board.cells[mv.cell].is_some() {
        return Err(RuleViolation::CellOccupied.into());
    }
    Ok(())
}

fn line_won(cells: &[Option<Mark>; 9], mark: Mark) -> bool {
    LINES
        .iter()
        .any(|line| line.iter().all(|&i| cells[i] == Some(mark)))
}

/// Rule engine for the three-in-a-row grid.
pub struct TicTacToeRules;

impl GameRules for TicTacToeRules {
    fn min_players(&self) -> usize {
        2
    }

    fn max_players(&self) -> usize {
        2
    }

    fn create_initial_state(&self, players: &[UserId]) -> GameState {
        let board = Board {
            cells: [None; 9],
            players: players.to_vec(),
            turn: 0,
            winner: None,
            draw: false,
        };
        // A fresh board is plain data; serialization cannot fail.
        encode_board(&board).expect("empty board serializes")
    }

    fn validate_move(
        &self,
        state: &GameState,
        user: &UserId,
        input: &MoveInput,
    ) -> Result<(), RulesError> {
        let board = decode_board(state)?;
        let mv = decode_move(input)?;
        check(&board, user, &mv)
    }

    fn apply_move(
        &self,
        state: &GameState,
        user: &UserId,
        input: &MoveInput,
    ) -> Result<GameState, RulesError> {
        let mut board = decode_board(state)?;
        let mv = decode_move(input)?;
        check(&board, user, &mv)?;

        let mark = if board.turn == 0 { Mark::X } else { Mark::O };
        board.cells[mv.cell] = Some(mark);

        if line_won(&board.cells, mark) {
            board.winner = Some(user.clone());
        } else if board.cells.iter().all(|c| c.is_some()) {
            board.draw = true;
        } else {
            board.turn = 1 - board.turn;
        }

        encode_board(&board)
    }

    fn check_end(&self, state: &GameState) -> Result<EndState, RulesError> {
        let board = decode_board(state)?;
        Ok(EndState {
            finished: board.decided(),
            winner: board.winner,
            is_draw: board.draw,
        })
    }
}
