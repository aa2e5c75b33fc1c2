//! Plain-text presentation for the command-line front end.

use crate::model::ModelAvailability;
use crate::session::{GameSession, GameStatus, SessionState};
use crate::training::TrainingJob;
use std::time::Duration;
use tictactoe_board::{Mark, Position};

/// A line typed during a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayInput {
    /// Place a mark.
    Move(Position),
    /// Start over.
    Reset,
    /// Leave.
    Quit,
}

/// Parses `row col` (0-based), `reset` or `quit`.
pub fn parse_play_input(line: &str) -> Option<PlayInput> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "reset" | "r" => return Some(PlayInput::Reset),
        "quit" | "q" | "exit" => return Some(PlayInput::Quit),
        _ => {}
    }
    let mut parts = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty());
    let row = parts.next()?.parse::<i64>().ok()?;
    let col = parts.next()?.parse::<i64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Position::from_row_col(row, col).map(PlayInput::Move)
}

/// Formats a duration as `{m}m {s}s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Board, status and prompt for a session change.
pub fn render_session(session: Option<&GameSession>, state: SessionState) -> String {
    let Some(session) = session else {
        return "No game in progress.".to_string();
    };

    let mut out = format!("Mode: {} ({})\n\n", session.mode, session.provider);
    out.push_str(&session.board.display());
    out.push('\n');
    let status = match (state, session.status) {
        (_, GameStatus::Won(Mark::Player)) => "You win!".to_string(),
        (_, GameStatus::Won(Mark::Agent)) => "The agent wins.".to_string(),
        (_, GameStatus::Draw) => "Draw.".to_string(),
        (SessionState::AwaitingAiMove, _) => "Agent is thinking...".to_string(),
        (SessionState::AwaitingHumanMove, _) => {
            format!("Your move ({}): enter `row col`", Mark::Player)
        }
        (state, _) => state.to_string(),
    };
    out.push_str(&status);
    out
}

/// One status line for a training job.
pub fn render_training(job: &TrainingJob) -> String {
    let mut line = format!(
        "[{}] generation {}/{} ({:.0}%) best {:.3} current {:.3} elapsed {}",
        job.status(),
        job.generation(),
        job.total_generations(),
        job.progress() * 100.0,
        job.best_fitness(),
        job.current_fitness(),
        format_duration(*job.elapsed()),
    );
    if let Some(remaining) = job.remaining() {
        line.push_str(&format!(" remaining {}", format_duration(*remaining)));
    }
    line
}

/// Model availability as shown to the user.
pub fn render_model(availability: &ModelAvailability) -> String {
    if availability.loaded {
        format!("Trained model loaded (best fitness {:.3})", availability.best_fitness)
    } else {
        "No trained model loaded".to_string()
    }
}
