//! Tic-tac-toe rules engine.
//!
//! Boards are immutable values: [`apply`] returns a new [`Board`] with the
//! mark placed, and [`evaluate`] reports whether the game is still open,
//! won, or drawn. Nothing in this crate performs I/O.
//!
//! ```
//! use tictactoe_board::{apply, evaluate, Board, Mark, Outcome, Position};
//!
//! let board = apply(&Board::new(), Position::Center, Mark::Player).unwrap();
//! assert_eq!(evaluate(&board), Outcome::Open);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
mod position;
pub mod rules;
mod types;

pub use engine::{apply, evaluate, BoardError, Outcome};
pub use position::Position;
pub use types::{Board, Cell, Mark};
