//! Authoritative grid state and its append-only move history

use shared::{empty_grid, Grid, Move, COLS, ROWS};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },
    #[error("a move must write exactly one character")]
    EmptyCell,
}

/// Point-in-time copy of the grid and its history.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Grid,
    pub history: Vec<Move>,
}

/// Owns the grid and the history that produced it.
///
/// Replaying `history` in order over an empty grid always yields `cells`.
#[derive(Debug, Clone)]
pub struct GridStore {
    cells: Grid,
    history: Vec<Move>,
}

impl GridStore {
    pub fn new() -> Self {
        Self {
            cells: empty_grid(),
            history: Vec::new(),
        }
    }

    /// Writes `ch` into the cell and appends the move to history.
    ///
    /// The coordinator validates everything before calling this, so an error
    /// here is a programming error rather than bad user input.
    pub fn apply_move(
        &mut self,
        row: usize,
        col: usize,
        ch: String,
        by: String,
        at: u64,
    ) -> Result<Move, GridError> {
        check_bounds(row, col)?;
        if ch.is_empty() {
            return Err(GridError::EmptyCell);
        }

        self.cells[row][col] = ch.clone();
        let applied = Move {
            row,
            col,
            ch,
            by,
            at,
        };
        self.history.push(applied.clone());
        Ok(applied)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.cells.clone(),
            history: self.history.clone(),
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(row)?.get(col).map(String::as_str)
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Timestamp of the most recently appended move
    pub fn last_timestamp(&self) -> Option<u64> {
        self.history.last().map(|m| m.at)
    }

    /// Rebuilds a grid by applying `history` in order, last write wins.
    pub fn replay(history: &[Move]) -> Result<Grid, GridError> {
        let mut grid = empty_grid();
        for m in history {
            check_bounds(m.row, m.col)?;
            grid[m.row][m.col] = m.ch.clone();
        }
        Ok(grid)
    }
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_bounds(row: usize, col: usize) -> Result<(), GridError> {
    if row >= ROWS || col >= COLS {
        return Err(GridError::OutOfBounds { row, col });
    }
    Ok(())
}
