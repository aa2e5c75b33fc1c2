//! Game sessions against the agent.

mod controller;

pub use controller::{AiMoveOutcome, SessionController};

use crate::providers::{GameMode, ProviderError, ProviderKind};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tictactoe_board::{apply, evaluate, Board, BoardError, Mark, Outcome, Position};
use tracing::{debug, info, instrument};

/// Where a game stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum GameStatus {
    /// Moves are still possible.
    #[display("in progress")]
    InProgress,
    /// A side completed a line.
    #[display("{_0} wins")]
    Won(Mark),
    /// Full board, no line.
    #[display("draw")]
    Draw,
}

impl GameStatus {
    /// Won or drawn.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    /// Winner, if any.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Self::Won(mark) => Some(mark),
            Self::InProgress | Self::Draw => None,
        }
    }
}

impl From<Outcome> for GameStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Open => Self::InProgress,
            Outcome::Won(mark) => Self::Won(mark),
            Outcome::Draw => Self::Draw,
        }
    }
}

/// One game against the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Identity of this session; a new one is issued on every start and reset.
    pub generation: u64,
    /// Current board.
    pub board: Board,
    /// Side expected to move next.
    pub to_move: Mark,
    /// Game status.
    pub status: GameStatus,
    /// Mode the session was started in.
    pub mode: GameMode,
    /// Provider producing the agent's moves.
    pub provider: ProviderKind,
}

impl GameSession {
    /// Creates a session with an empty board and the human to move.
    #[instrument]
    pub fn new(generation: u64, mode: GameMode) -> Self {
        info!(generation, %mode, "Creating game session");
        Self {
            generation,
            board: Board::new(),
            to_move: Mark::Player,
            status: GameStatus::InProgress,
            mode,
            provider: mode.provider_kind(),
        }
    }

    /// Places `mark` at `position`, replacing the board and re-evaluating.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn apply_move(&mut self, position: Position, mark: Mark) -> Result<GameStatus, SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::GameOver {
                status: self.status,
            });
        }
        self.board = apply(&self.board, position, mark)?;
        self.status = evaluate(&self.board).into();
        self.to_move = mark.opponent();
        debug!(status = %self.status, "Move applied");
        Ok(self.status)
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum SessionState {
    /// No session.
    #[display("idle")]
    Idle,
    /// Waiting for the human.
    #[display("awaiting human move")]
    AwaitingHumanMove,
    /// An agent move request is outstanding.
    #[display("awaiting agent move")]
    AwaitingAiMove,
    /// The game is over.
    #[display("game over")]
    Terminal,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session or controller state changed.
    Changed {
        /// Snapshot of the session, absent when idle.
        session: Option<GameSession>,
        /// New controller state.
        state: SessionState,
    },
    /// An operation failed.
    Error(SessionError),
}

/// Requests from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start a new game in a mode.
    Start(GameMode),
    /// Place the human's mark.
    HumanMove(Position),
    /// Throw away the current game.
    Reset,
}

/// Game session failures.
#[derive(Debug, Clone, PartialEq, Display, derive_more::Error)]
pub enum SessionError {
    /// A human move arrived outside the human's turn.
    #[display("cannot accept a move while {state}")]
    NotAwaitingHumanMove {
        /// State at the time of the attempt.
        state: SessionState,
    },
    /// The game has already ended.
    #[display("game is over ({status})")]
    GameOver {
        /// Final status.
        status: GameStatus,
    },
    /// The board rejected the move.
    #[display("{_0}")]
    Board(BoardError),
    /// The agent could not produce a move.
    #[display("{_0}")]
    Provider(ProviderError),
}

impl From<BoardError> for SessionError {
    fn from(err: BoardError) -> Self {
        Self::Board(err)
    }
}

impl From<ProviderError> for SessionError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}
