//! Move application and outcome evaluation.

use crate::rules::{check_winner, is_full};
use crate::{Board, Cell, Mark, Position};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Where a board stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Outcome {
    /// At least one empty cell and no line.
    #[display("open")]
    Open,
    /// A mark holds a full line.
    #[display("{_0} wins")]
    Won(Mark),
    /// Board full, no line.
    #[display("draw")]
    Draw,
}

impl Outcome {
    /// True for `Won` and `Draw`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Open)
    }
}

/// Error placing a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardError {
    /// The target cell already holds a mark.
    #[display("cell {_0} is already occupied")]
    OccupiedCell(#[error(not(source))] Position),
}

/// Places `mark` at `position`, returning the new board.
///
/// The input board is left untouched.
#[instrument(skip(board))]
pub fn apply(board: &Board, position: Position, mark: Mark) -> Result<Board, BoardError> {
    if !board.is_empty(position) {
        debug!(%position, "Rejected move onto occupied cell");
        return Err(BoardError::OccupiedCell(position));
    }
    Ok(board.with(position, Cell::Marked(mark)))
}

/// Evaluates a board: a completed line wins, otherwise a full board draws.
#[instrument(level = "trace")]
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(mark) = check_winner(board) {
        Outcome::Won(mark)
    } else if is_full(board) {
        Outcome::Draw
    } else {
        Outcome::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_leaves_input_untouched() {
        let empty = Board::new();
        let next = apply(&empty, Position::Center, Mark::Player).unwrap();

        assert_eq!(empty, Board::new());
        assert_eq!(next.get(Position::Center), Cell::Marked(Mark::Player));
    }

    #[test]
    fn test_apply_rejects_occupied_cell() {
        let board = apply(&Board::new(), Position::TopLeft, Mark::Agent).unwrap();
        let result = apply(&board, Position::TopLeft, Mark::Player);
        assert_eq!(result, Err(BoardError::OccupiedCell(Position::TopLeft)));
    }

    #[test]
    fn test_win_on_last_cell_is_not_draw() {
        // X O X / O X O / O X X  -> X completes the main diagonal on the last move.
        let x = Cell::Marked(Mark::Player);
        let o = Cell::Marked(Mark::Agent);
        let board = Board::from_rows([[x, o, x], [o, x, o], [o, x, x]]);
        assert_eq!(evaluate(&board), Outcome::Won(Mark::Player));
    }

    #[test]
    fn test_outcome_terminality() {
        assert!(!Outcome::Open.is_terminal());
        assert!(Outcome::Draw.is_terminal());
        assert!(Outcome::Won(Mark::Agent).is_terminal());
    }
}
