//! Four-in-a-row rules: a 6-row × 7-column drop grid.
//!
//! A move payload is `{"column": n}`; the piece falls to the lowest free
//! row of that column. The first seated player moves first. The winner
//! check scans rows, columns, and both diagonals for a run of four; the
//! first run found decides the game.

use parlor_protocol::{GameState, MoveInput, RuleViolation, UserId};
use serde::{Deserialize, Serialize};

use crate::{EndState, GameRules, RulesError};

const COLS: usize = 7;
const ROWS: usize = 6;
const RUN: usize = 4;

/// Scan directions: right, up, up-right, down-right.
const DIRS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// The full grid state as stored in a session.
///
/// Pieces are seat indexes (0 or 1) stacked bottom-up per column, so
/// gravity is just `Vec::push`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Grid {
    columns: Vec<Vec<u8>>,
    /// Seats in turn order; index 0 drops first.
    players: Vec<UserId>,
    /// Index into `players` of whoever moves next.
    turn: usize,
    winner: Option<UserId>,
    draw: bool,
}

impl Grid {
    fn decided(&self) -> bool {
        self.winner.is_some() || self.draw
    }

    fn full(&self) -> bool {
        self.columns.iter().all(|col| col.len() >= ROWS)
    }

    fn seat_at(&self, col: i32, row: i32) -> Option<u8> {
        if col < 0 || row < 0 {
            return None;
        }
        self.columns.get(col as usize)?.get(row as usize).copied()
    }

    /// Whether `seat` holds any run of four anywhere on the grid.
    fn has_run(&self, seat: u8) -> bool {
        for col in 0..COLS as i32 {
            for row in 0..self.columns[col as usize].len() as i32 {
                if self.seat_at(col, row) != Some(seat) {
                    continue;
                }
                for (dc, dr) in DIRS {
                    let run = (0..RUN as i32).all(|k| {
                        self.seat_at(col + dc * k, row + dr * k) == Some(seat)
                    });
                    if run {
                        return true;
                    }
                }
            }
        }
        false
    }
}

#[derive(Debug, Deserialize)]
struct ColumnMove {
    column: usize,
}

fn decode_grid(state: &GameState) -> Result<Grid, RulesError> {
    serde_json::from_value(state.0.clone())
        .map_err(|e| RulesError::CorruptState(e.to_string()))
}

fn encode_grid(grid: &Grid) -> Result<GameState, RulesError> {
    serde_json::to_value(grid)
        .map(GameState)
        .map_err(|e| RulesError::CorruptState(e.to_string()))
}

fn decode_move(input: &MoveInput) -> Result<ColumnMove, RulesError> {
    serde_json::from_value(input.0.clone())
        .map_err(|e| RulesError::Malformed(e.to_string()))
}

fn check(grid: &Grid, user: &UserId, mv: &ColumnMove) -> Result<(), RulesError> {
    if grid.decided() {
        return Err(RuleViolation::GameFinished.into());
    }
    if grid.players.get(grid.turn) != Some(user) {
        return Err(RuleViolation::NotYourTurn.into());
    }
    if mv.column >= COLS {
        return Err(RuleViolation::InvalidTarget.into());
    }
    if grid.columns[mv.column].len() >= ROWS {
        return Err(RuleViolation::ColumnFull.into());
    }
    Ok(())
}

/// Rule engine for the four-in-a-row drop grid.
pub struct ConnectFourRules;

impl GameRules for ConnectFourRules {
    fn min_players(&self) -> usize {
        2
    }

    fn max_players(&self) -> usize {
        2
    }

    fn create_initial_state(&self, players: &[UserId]) -> GameState {
        let grid = Grid {
            columns: vec![Vec::new(); COLS],
            players: players.to_vec(),
            turn: 0,
            winner: None,
            draw: false,
        };
        // A fresh grid is plain data; serialization cannot fail.
        encode_grid(&grid).expect("empty grid serializes")
    }

    fn validate_move(
        &self,
        state: &GameState,
        user: &UserId,
        input: &MoveInput,
    ) -> Result<(), RulesError> {
        let grid = decode_grid(state)?;
        let mv = decode_move(input)?;
        check(&grid, user, &mv)
    }

    fn apply_move(
        &self,
        state: &GameState,
        user: &UserId,
        input: &MoveInput,
    ) -> Result<GameState, RulesError> {
        let mut grid = decode_grid(state)?;
        let mv = decode_move(input)?;
        check(&grid, user, &mv)?;

        let seat = grid.turn as u8;
        grid.columns[mv.column].push(seat);

        if grid.has_run(seat) {
            grid.winner = Some(user.clone());
        } else if grid.full() {
            grid.draw = true;
        } else {
            grid.turn = 1 - grid.turn;
        }

        encode_grid(&grid)
    }

    fn check_end(&self, state: &GameState) -> Result<EndState, RulesError> {
        let grid = decode_grid(state)?;
        Ok(EndState {
            finished: grid.decided(),
            winner: grid.winner,
            is_draw: grid.draw,
        })
    }
}
