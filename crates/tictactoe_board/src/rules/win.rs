//! Win detection.

use crate::{Board, Cell, Mark, Position};
use tracing::instrument;

/// Every line that wins: three rows, three columns, two diagonals.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [Position::MiddleLeft, Position::Center, Position::MiddleRight],
    [Position::BottomLeft, Position::BottomCenter, Position::BottomRight],
    // Columns
    [Position::TopLeft, Position::MiddleLeft, Position::BottomLeft],
    [Position::TopCenter, Position::Center, Position::BottomCenter],
    [Position::TopRight, Position::MiddleRight, Position::BottomRight],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Returns the mark holding three in a line, if any.
#[instrument(level = "trace")]
pub fn check_winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| {
        let cell = board.get(*a);
        match cell {
            Cell::Marked(mark) if cell == board.get(*b) && cell == board.get(*c) => Some(mark),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark_all(mark: Mark, positions: &[Position]) -> Board {
        let mut rows = [[Cell::Empty; 3]; 3];
        for position in positions {
            rows[position.row()][position.col()] = Cell::Marked(mark);
        }
        Board::from_rows(rows)
    }

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(check_winner(&Board::new()), None);
    }

    #[test]
    fn test_every_line_wins() {
        for line in LINES {
            let board = mark_all(Mark::Agent, &line);
            assert_eq!(check_winner(&board), Some(Mark::Agent), "line {line:?}");
        }
    }

    #[test]
    fn test_no_winner_incomplete_line() {
        let board = mark_all(Mark::Player, &[Position::TopLeft, Position::TopCenter]);
        assert_eq!(check_winner(&board), None);
    }

    #[test]
    fn test_mixed_line_does_not_win() {
        let mut rows = [[Cell::Empty; 3]; 3];
        rows[0] = [
            Cell::Marked(Mark::Player),
            Cell::Marked(Mark::Agent),
            Cell::Marked(Mark::Player),
        ];
        assert_eq!(check_winner(&Board::from_rows(rows)), None);
    }
}
