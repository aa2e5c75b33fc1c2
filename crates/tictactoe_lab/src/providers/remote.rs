//! Providers backed by the move server.

use super::{MoveProvider, ProviderError, ProviderKind};
use crate::model::ModelAvailabilityReader;
use crate::transport::{MoveEndpoint, MoveReply, MoveRequest, MoveService, TransportError};
use derive_new::new;
use std::sync::Arc;
use tictactoe_board::Position;
use tracing::{debug, instrument, warn};

/// Minimax search on the server.
#[derive(new)]
pub struct RemoteSearch {
    service: Arc<dyn MoveService>,
}

#[async_trait::async_trait]
impl MoveProvider for RemoteSearch {
    fn kind(&self) -> ProviderKind {
        ProviderKind::RemoteSearch
    }

    #[instrument(skip_all, fields(mover = %request.mover))]
    async fn select_move(&self, request: &MoveRequest) -> Result<Position, ProviderError> {
        request_remote_move(self.service.as_ref(), MoveEndpoint::Search, request).await
    }
}

/// Trained network on the server. Needs a loaded model.
#[derive(new)]
pub struct RemoteInference {
    service: Arc<dyn MoveService>,
    model: ModelAvailabilityReader,
}

#[async_trait::async_trait]
impl MoveProvider for RemoteInference {
    fn kind(&self) -> ProviderKind {
        ProviderKind::RemoteInference
    }

    #[instrument(skip_all, fields(mover = %request.mover))]
    async fn select_move(&self, request: &MoveRequest) -> Result<Position, ProviderError> {
        if !self.model.is_loaded() {
            warn!("Trained model requested before one was loaded");
            return Err(ProviderError::ModelNotLoaded);
        }
        request_remote_move(self.service.as_ref(), MoveEndpoint::Inference, request).await
    }
}

async fn request_remote_move(
    service: &dyn MoveService,
    endpoint: MoveEndpoint,
    request: &MoveRequest,
) -> Result<Position, ProviderError> {
    debug!(%endpoint, "Requesting remote move");
    let reply = service
        .request_move(endpoint, request)
        .await
        .map_err(from_transport)?;
    validate_reply(&reply, request)
}

fn from_transport(error: TransportError) -> ProviderError {
    match error {
        TransportError::Decode { message } => ProviderError::malformed(message),
        other => ProviderError::unavailable(other.reason()),
    }
}

/// Checks a reply against the board it was requested for.
fn validate_reply(reply: &MoveReply, request: &MoveRequest) -> Result<Position, ProviderError> {
    if let Some(error) = &reply.error {
        let message = match &reply.details {
            Some(details) => format!("{}: {}", error, details),
            None => error.clone(),
        };
        return Err(ProviderError::unavailable(message));
    }
    if let Some(warning) = &reply.warning {
        warn!(%warning, move_type = ?reply.move_type, "Move server warning");
    }

    let (row, col) = match (reply.row, reply.col) {
        (Some(row), Some(col)) => (row, col),
        _ => return Err(ProviderError::malformed("reply has no row/col")),
    };
    let position = Position::from_row_col(row, col)
        .ok_or_else(|| ProviderError::malformed(format!("cell ({}, {}) is off the board", row, col)))?;
    if !request.board.is_empty(position) {
        return Err(ProviderError::malformed(format!(
            "cell {} is already occupied",
            position
        )));
    }

    debug!(%position, move_type = ?reply.move_type, "Remote move accepted");
    Ok(position)
}
