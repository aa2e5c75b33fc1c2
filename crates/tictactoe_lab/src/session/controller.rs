//! Sequencing of human and agent turns.

use super::{GameSession, SessionCommand, SessionError, SessionEvent, SessionState};
use crate::model::ModelAvailabilityReader;
use crate::providers::{GameMode, ProviderError, Providers};
use crate::transport::MoveRequest;
use tictactoe_board::{Mark, Position};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Result of a background agent move request.
#[derive(Debug, Clone, PartialEq)]
pub struct AiMoveOutcome {
    /// Session the request was issued for.
    pub generation: u64,
    /// The provider's answer.
    pub result: Result<Position, ProviderError>,
}

/// Owns the active game session and drives it through its states.
///
/// Agent moves are requested on a spawned task and come back through an
/// internal channel. At most one request is outstanding per session; results
/// for a session that has since been reset are ignored.
pub struct SessionController {
    providers: Providers,
    model: ModelAvailabilityReader,
    events: mpsc::UnboundedSender<SessionEvent>,
    session: Option<GameSession>,
    state: SessionState,
    mode: Option<GameMode>,
    generation: u64,
    in_flight: Option<u64>,
    ai_tx: mpsc::UnboundedSender<AiMoveOutcome>,
    ai_rx: mpsc::UnboundedReceiver<AiMoveOutcome>,
}

impl SessionController {
    /// Creates an idle controller.
    pub fn new(
        providers: Providers,
        model: ModelAvailabilityReader,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (ai_tx, ai_rx) = mpsc::unbounded_channel();
        Self {
            providers,
            model,
            events,
            session: None,
            state: SessionState::Idle,
            mode: None,
            generation: 0,
            in_flight: None,
            ai_tx,
            ai_rx,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Active session, if any.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Mode of the active session.
    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    /// Generation of the session whose agent move is outstanding.
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Whether `mode` can currently produce agent moves.
    pub fn mode_available(&self, mode: GameMode) -> bool {
        match mode {
            GameMode::Neural => self.model.is_loaded(),
            GameMode::Random | GameMode::Minimax => true,
        }
    }

    /// Starts a fresh game in `mode`.
    #[instrument(skip(self))]
    pub fn start(&mut self, mode: GameMode) {
        if !self.mode_available(mode) {
            warn!(%mode, "Mode selected before its model is loaded");
        }
        self.generation += 1;
        self.in_flight = None;
        self.mode = Some(mode);
        self.session = Some(GameSession::new(self.generation, mode));
        self.transition(SessionState::AwaitingHumanMove);
    }

    /// Discards the current game.
    ///
    /// With a mode selected a new empty game starts immediately; otherwise the
    /// controller goes back to idle. An outstanding agent move is not
    /// cancelled, its result is ignored when it arrives.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        if let Some(generation) = self.in_flight.take() {
            debug!(generation, "Abandoning outstanding agent move");
        }
        match self.mode {
            Some(mode) => self.start(mode),
            None => {
                self.generation += 1;
                self.session = None;
                self.transition(SessionState::Idle);
            }
        }
    }

    /// Places the human's mark and, if the game goes on, asks for the agent's reply.
    #[instrument(skip(self))]
    pub fn submit_human_move(&mut self, position: Position) -> Result<(), SessionError> {
        if self.state != SessionState::AwaitingHumanMove {
            return Err(self.fail(SessionError::NotAwaitingHumanMove { state: self.state }));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(self.fail(SessionError::NotAwaitingHumanMove { state: self.state }));
        };

        let status = match session.apply_move(position, Mark::Player) {
            Ok(status) => status,
            Err(e) => return Err(self.fail(e)),
        };
        info!(%position, %status, "Human moved");

        if status.is_terminal() {
            self.transition(SessionState::Terminal);
        } else {
            self.transition(SessionState::AwaitingAiMove);
            self.dispatch_ai_move();
        }
        Ok(())
    }

    /// Applies an agent move result.
    ///
    /// Returns `false` when the result belongs to a session that is no longer
    /// active and was ignored.
    #[instrument(skip(self), fields(generation = outcome.generation))]
    pub fn resolve_ai_move(&mut self, outcome: AiMoveOutcome) -> bool {
        if self.in_flight != Some(outcome.generation) || self.state != SessionState::AwaitingAiMove {
            warn!(current = self.generation, "Ignoring stale agent move");
            return false;
        }
        self.in_flight = None;

        let applied = match outcome.result {
            Ok(position) => match self.session.as_mut() {
                Some(session) => session.apply_move(position, Mark::Agent).map(|status| (position, status)),
                None => return false,
            },
            Err(e) => Err(e.into()),
        };

        match applied {
            Ok((position, status)) => {
                info!(%position, %status, "Agent moved");
                let next = if status.is_terminal() {
                    SessionState::Terminal
                } else {
                    SessionState::AwaitingHumanMove
                };
                self.transition(next);
            }
            Err(e) => {
                warn!(error = %e, "Agent move failed, human to move again");
                if let Some(session) = self.session.as_mut() {
                    session.to_move = Mark::Player;
                }
                self.transition(SessionState::AwaitingHumanMove);
                self.fail(e);
            }
        }
        true
    }

    /// Waits for the next agent move result and applies it.
    pub async fn process_next(&mut self) -> bool {
        match self.ai_rx.recv().await {
            Some(outcome) => self.resolve_ai_move(outcome),
            None => false,
        }
    }

    /// Handles one presentation command.
    pub fn handle_command(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::Start(mode) => {
                self.start(mode);
                Ok(())
            }
            SessionCommand::HumanMove(position) => self.submit_human_move(position),
            SessionCommand::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Serves commands until the sender is dropped.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        info!("Session controller running");
        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                Some(outcome) = self.ai_rx.recv() => Step::AiMove(outcome),
            };
            match step {
                Step::Command(Some(command)) => {
                    if let Err(e) = self.handle_command(command) {
                        debug!(error = %e, "Command rejected");
                    }
                }
                Step::Command(None) => break,
                Step::AiMove(outcome) => {
                    self.resolve_ai_move(outcome);
                }
            }
        }
        info!("Session controller stopped");
    }

    fn dispatch_ai_move(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let provider = self.providers.for_kind(session.provider);
        let request = MoveRequest::new(session.board, Mark::Agent);
        let generation = session.generation;
        let tx = self.ai_tx.clone();

        debug!(generation, provider = %provider.kind(), "Requesting agent move");
        self.in_flight = Some(generation);
        tokio::spawn(async move {
            let result = provider.select_move(&request).await;
            if tx.send(AiMoveOutcome { generation, result }).is_err() {
                debug!(generation, "Controller gone before agent move arrived");
            }
        });
    }

    fn transition(&mut self, state: SessionState) {
        info!(from = %self.state, to = %state, "Session state change");
        self.state = state;
        self.notify(SessionEvent::Changed {
            session: self.session.clone(),
            state,
        });
    }

    fn fail(&self, error: SessionError) -> SessionError {
        warn!(%error, "Session error");
        self.notify(SessionEvent::Error(error.clone()));
        error
    }

    fn notify(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("No listener for session events");
        }
    }
}

enum Step {
    Command(Option<SessionCommand>),
    AiMove(AiMoveOutcome),
}
