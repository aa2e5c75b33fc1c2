//! Full-board detection.

use crate::{Board, Cell};
use tracing::instrument;

/// Checks if every cell is occupied.
///
/// A full board with no winner is a draw.
#[instrument(level = "trace")]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|cell| *cell != Cell::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mark, Position};

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_partial_board_not_full() {
        let board = Board::new().with(Position::Center, Cell::Marked(Mark::Player));
        assert!(!is_full(&board));
    }

    #[test]
    fn test_full_board() {
        let board = Board::from_rows([[Cell::Marked(Mark::Agent); 3]; 3]);
        assert!(is_full(&board));
    }
}
