//! Move providers: how the agent's next move is produced.

mod random;
mod remote;

pub use random::LocalRandom;
pub use remote::{RemoteInference, RemoteSearch};

use crate::model::ModelAvailabilityReader;
use crate::transport::{MoveRequest, MoveService};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tictactoe_board::Position;
use tracing::error;

/// Trait for anything that can pick the agent's move.
#[async_trait::async_trait]
pub trait MoveProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// Chooses a move for `request.mover` on `request.board`.
    ///
    /// The returned position is empty on the requested board.
    async fn select_move(&self, request: &MoveRequest) -> Result<Position, ProviderError>;
}

/// Identity of a move provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Uniform choice among empty cells, computed locally.
    #[display("local-random")]
    LocalRandom,
    /// Server-side minimax search.
    #[display("remote-search")]
    RemoteSearch,
    /// Server-side trained network.
    #[display("remote-inference")]
    RemoteInference,
}

/// Game mode chosen by the user.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    /// Play against random moves.
    Random,
    /// Play against minimax search.
    Minimax,
    /// Play against the trained network.
    Neural,
}

impl GameMode {
    /// Provider that backs this mode.
    pub fn provider_kind(self) -> ProviderKind {
        match self {
            Self::Random => ProviderKind::LocalRandom,
            Self::Minimax => ProviderKind::RemoteSearch,
            Self::Neural => ProviderKind::RemoteInference,
        }
    }
}

/// Why a provider could not produce a move.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum ProviderError {
    /// No empty cell is left.
    #[display("board is full")]
    BoardFull,
    /// The move service could not be reached or refused the request.
    #[display("move provider unavailable: {message}")]
    ProviderUnavailable {
        /// Cause reported by the transport or the server.
        message: String,
    },
    /// The move service answered with an unusable move.
    #[display("malformed move response: {message}")]
    MalformedResponse {
        /// What was wrong with the reply.
        message: String,
    },
    /// The trained network was requested before a model was loaded.
    #[display("no trained model is loaded")]
    ModelNotLoaded,
}

impl ProviderError {
    /// Unreachable or failing service.
    pub fn unavailable(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "Move provider unavailable");
        Self::ProviderUnavailable { message }
    }

    /// Unusable reply.
    pub fn malformed(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "Malformed move response");
        Self::MalformedResponse { message }
    }
}

/// The three providers, one per [`ProviderKind`].
#[derive(Clone)]
pub struct Providers {
    random: Arc<dyn MoveProvider>,
    search: Arc<dyn MoveProvider>,
    inference: Arc<dyn MoveProvider>,
}

impl Providers {
    /// Builds the standard provider set over one move service.
    pub fn new(service: Arc<dyn MoveService>, model: ModelAvailabilityReader) -> Self {
        Self::with_random(service, model, LocalRandom::new())
    }

    /// Like [`Providers::new`] with a caller-supplied random provider.
    pub fn with_random(
        service: Arc<dyn MoveService>,
        model: ModelAvailabilityReader,
        random: LocalRandom,
    ) -> Self {
        Self {
            random: Arc::new(random),
            search: Arc::new(RemoteSearch::new(Arc::clone(&service))),
            inference: Arc::new(RemoteInference::new(service, model)),
        }
    }

    /// Provider for `kind`.
    pub fn for_kind(&self, kind: ProviderKind) -> Arc<dyn MoveProvider> {
        match kind {
            ProviderKind::LocalRandom => Arc::clone(&self.random),
            ProviderKind::RemoteSearch => Arc::clone(&self.search),
            ProviderKind::RemoteInference => Arc::clone(&self.inference),
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}
