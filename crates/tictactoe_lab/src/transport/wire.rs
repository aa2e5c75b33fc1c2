//! Request and response payloads.

use super::TransportError;
use serde::{Deserialize, Serialize};
use tictactoe_board::{Board, Cell, Mark};

/// Wire value for a mark: the agent is `1`, the human `-1`, empty `0`.
fn mark_value(mark: Mark) -> i8 {
    match mark {
        Mark::Agent => 1,
        Mark::Player => -1,
    }
}

/// Encodes a board as three rows of `{-1, 0, 1}`.
pub fn encode_board(board: &Board) -> [[i8; 3]; 3] {
    board.rows().map(|row| {
        row.map(|cell| match cell {
            Cell::Empty => 0,
            Cell::Marked(mark) => mark_value(mark),
        })
    })
}

/// A request for the agent's next move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    /// Snapshot of the board at request time.
    pub board: Board,
    /// Side that has to move.
    pub mover: Mark,
}

impl MoveRequest {
    /// Creates a new request.
    pub fn new(board: Board, mover: Mark) -> Self {
        Self { board, mover }
    }

    /// JSON body for the move endpoints.
    pub fn body(&self) -> MoveRequestBody {
        MoveRequestBody {
            board: encode_board(&self.board),
            player: mark_value(self.mover),
        }
    }
}

/// JSON body of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveRequestBody {
    /// Board rows.
    pub board: [[i8; 3]; 3],
    /// Wire value of the mover.
    pub player: i8,
}

/// Body returned by a move endpoint.
///
/// Success carries `row`/`col`; failure carries `error` (and sometimes
/// `details`). Fields are optional so the caller can tell a missing cell
/// from a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MoveReply {
    /// Target row.
    #[serde(default)]
    pub row: Option<i64>,
    /// Target column.
    #[serde(default)]
    pub col: Option<i64>,
    /// How the server produced the move (e.g., "random_fallback").
    #[serde(default)]
    pub move_type: Option<String>,
    /// Non-fatal server warning.
    #[serde(default)]
    pub warning: Option<String>,
    /// Error message.
    #[serde(default)]
    pub error: Option<String>,
    /// Extra detail for `error`.
    #[serde(default)]
    pub details: Option<String>,
}

impl MoveReply {
    /// Successful reply pointing at a cell.
    pub fn at(row: i64, col: i64) -> Self {
        Self {
            row: Some(row),
            col: Some(col),
            ..Self::default()
        }
    }
}

/// Parameters of a training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    /// Generations to evolve.
    pub generations: i64,
    /// Games per individual each generation.
    pub games: i64,
    /// Individuals per generation.
    pub population_size: i64,
}

/// Error body of the training endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message in a raw body.
    pub(crate) fn message_from(text: &str) -> Option<String> {
        let body: ErrorBody = serde_json::from_str(text).ok()?;
        body.message.or(body.error)
    }
}

/// Fields shared by every status event. All optional: servers send only
/// what applies.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusPayload {
    /// Generation just finished.
    #[serde(default)]
    pub generation: Option<u32>,
    /// Generations requested.
    #[serde(default)]
    pub total_generations: Option<u32>,
    /// Fraction complete in `0.0..=1.0`.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Best fitness seen so far.
    #[serde(default)]
    pub best_fitness: Option<f64>,
    /// Fitness of the latest generation.
    #[serde(default)]
    pub current_fitness: Option<f64>,
    /// Human-readable status line.
    #[serde(default)]
    pub message: Option<String>,
}

/// One message from the status stream, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusEvent {
    /// Job is running.
    Training(StatusPayload),
    /// Job finished and produced a model.
    Completed(StatusPayload),
    /// Job failed on the server.
    Error(StatusPayload),
    /// Job stopped at the user's request.
    Cancelled(StatusPayload),
}

impl StatusEvent {
    /// Parses a `data:` payload.
    pub fn parse(data: &str) -> Result<Self, TransportError> {
        serde_json::from_str(data)
            .map_err(|e| TransportError::decode(format!("invalid status event: {e}: {data}")))
    }

    /// Fields of the event.
    pub fn payload(&self) -> &StatusPayload {
        match self {
            Self::Training(payload)
            | Self::Completed(payload)
            | Self::Error(payload)
            | Self::Cancelled(payload) => payload,
        }
    }

    /// Terminal events end the job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Training(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_board::Position;

    #[test]
    fn test_move_body_uses_signed_marks() {
        let board = tictactoe_board::apply(&Board::new(), Position::TopLeft, Mark::Player).unwrap();
        let board = tictactoe_board::apply(&board, Position::Center, Mark::Agent).unwrap();

        let json = serde_json::to_value(MoveRequest::new(board, Mark::Agent).body()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"board": [[-1, 0, 0], [0, 1, 0], [0, 0, 0]], "player": 1})
        );
    }

    #[test]
    fn test_training_event_ignores_extra_fields() {
        let event = StatusEvent::parse(
            r#"{"status": "training", "progress": 0.4, "generation": 2, "total_generations": 5,
                "best_fitness": 0.7, "current_fitness": 0.6, "elapsed_time": 12.5,
                "remaining_time": null, "stats": {"status": "training"}, "model_loaded": false,
                "message": "Gen 2/5"}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            StatusEvent::Training(StatusPayload {
                generation: Some(2),
                total_generations: Some(5),
                progress: Some(0.4),
                best_fitness: Some(0.7),
                current_fitness: Some(0.6),
                message: Some("Gen 2/5".to_string()),
            })
        );
    }

    #[test]
    fn test_terminal_events_parse_with_sparse_payloads() {
        let cancelled = StatusEvent::parse(r#"{"status": "cancelled"}"#).unwrap();
        assert!(cancelled.is_terminal());
        assert_eq!(cancelled.payload(), &StatusPayload::default());

        let error = StatusEvent::parse(r#"{"status": "error", "message": "boom"}"#).unwrap();
        assert_eq!(error.payload().message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        let result = StatusEvent::parse(r#"{"status": "initializing"}"#);
        assert!(matches!(result, Err(TransportError::Decode { .. })));
        assert!(StatusEvent::parse("not json").is_err());
    }

    #[test]
    fn test_error_body_prefers_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"status": "error", "message": "already running"}"#),
            Some("already running".to_string())
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"error": "no model"}"#),
            Some("no model".to_string())
        );
        assert_eq!(ErrorBody::message_from("<html>"), None);
    }
}
