//! Core domain types for the board.

use crate::Position;
use serde::{Deserialize, Serialize};

/// Which side owns a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Mark {
    /// The human player (moves first).
    #[display("X")]
    Player,
    /// The AI agent.
    #[display("O")]
    Agent,
}

impl Mark {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Mark::Player => Mark::Agent,
            Mark::Agent => Mark::Player,
        }
    }
}

/// A single cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Occupied by a mark.
    Marked(Mark),
}

impl Cell {
    /// Returns the mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Marked(mark) => Some(mark),
        }
    }
}

/// 3x3 board, stored in row-major order.
///
/// Boards are never mutated through the public API; placing a mark goes
/// through [`crate::apply`], which hands back a new board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from three rows of cells.
    pub fn from_rows(rows: [[Cell; 3]; 3]) -> Self {
        let mut cells = [Cell::Empty; 9];
        for (row, line) in rows.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                cells[row * 3 + col] = *cell;
            }
        }
        Self { cells }
    }

    /// Returns the board as three rows of cells.
    pub fn rows(&self) -> [[Cell; 3]; 3] {
        let mut rows = [[Cell::Empty; 3]; 3];
        for (index, cell) in self.cells.iter().enumerate() {
            rows[index / 3][index % 3] = *cell;
        }
        rows
    }

    /// Gets the cell at a position.
    pub fn get(&self, position: Position) -> Cell {
        self.cells[position.to_index()]
    }

    /// Checks if the cell at a position is empty.
    pub fn is_empty(&self, position: Position) -> bool {
        self.get(position) == Cell::Empty
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Positions that are still free, in row-major order.
    pub fn empty_positions(&self) -> Vec<Position> {
        Position::ALL
            .iter()
            .copied()
            .filter(|position| self.is_empty(*position))
            .collect()
    }

    /// Copy of this board with one cell replaced.
    pub(crate) fn with(mut self, position: Position, cell: Cell) -> Self {
        self.cells[position.to_index()] = cell;
        self
    }

    /// Formats the board as a human-readable grid.
    ///
    /// Empty cells show their 1-based position number.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let index = row * 3 + col;
                let symbol = match self.cells[index] {
                    Cell::Empty => (index + 1).to_string(),
                    Cell::Marked(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_round_trip_preserves_layout() {
        let p = Cell::Marked(Mark::Player);
        let a = Cell::Marked(Mark::Agent);
        let e = Cell::Empty;
        let rows = [[p, e, e], [e, a, e], [e, e, p]];
        let board = Board::from_rows(rows);

        assert_eq!(board.rows(), rows);
        assert_eq!(board.get(Position::TopLeft), p);
        assert_eq!(board.get(Position::Center), a);
        assert_eq!(board.get(Position::BottomRight), p);
    }

    #[test]
    fn test_empty_positions_skip_marked_cells() {
        let board = Board::new()
            .with(Position::TopLeft, Cell::Marked(Mark::Player))
            .with(Position::Center, Cell::Marked(Mark::Agent));

        let free = board.empty_positions();
        assert_eq!(free.len(), 7);
        assert!(!free.contains(&Position::TopLeft));
        assert!(!free.contains(&Position::Center));
    }

    #[test]
    fn test_display_shows_numbers_for_empty_cells() {
        let board = Board::new().with(Position::Center, Cell::Marked(Mark::Player));
        assert_eq!(board.display(), "1|2|3\n-+-+-\n4|X|6\n-+-+-\n7|8|9");
    }

    #[test]
    fn test_opponent_swaps_sides() {
        assert_eq!(Mark::Player.opponent(), Mark::Agent);
        assert_eq!(Mark::Agent.opponent(), Mark::Player);
    }
}
