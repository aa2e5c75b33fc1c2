//! Network boundary.
//!
//! Everything the core needs from the server sits behind two traits so the
//! controllers can run against [`HttpBackend`] in production and in-memory
//! fakes in tests.

mod http;
mod sse;
mod wire;

pub use http::HttpBackend;
pub use sse::SseDecoder;
pub use wire::{
    encode_board, JobRequest, MoveReply, MoveRequest, MoveRequestBody, StatusEvent, StatusPayload,
};

use crate::model::ModelAvailability;
use derive_more::{Display, Error};
use futures::stream::BoxStream;
use tracing::error;

/// Which remote move endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MoveEndpoint {
    /// Minimax search.
    #[display("minimax")]
    Search,
    /// Trained neural network.
    #[display("neural-network")]
    Inference,
}

/// Decoded events from the training status stream.
pub type StatusStream = BoxStream<'static, Result<StatusEvent, TransportError>>;

/// Requests the agent's moves.
#[async_trait::async_trait]
pub trait MoveService: Send + Sync {
    /// Sends a board snapshot and returns the server's reply.
    async fn request_move(
        &self,
        endpoint: MoveEndpoint,
        request: &MoveRequest,
    ) -> Result<MoveReply, TransportError>;
}

/// Drives training jobs on the server.
#[async_trait::async_trait]
pub trait TrainingService: Send + Sync {
    /// Creates a training job.
    async fn submit_job(&self, request: &JobRequest) -> Result<(), TransportError>;

    /// Asks the server to stop the running job.
    async fn cancel_job(&self) -> Result<(), TransportError>;

    /// Queries whether a trained model is loaded.
    async fn model_status(&self) -> Result<ModelAvailability, TransportError>;

    /// Opens the push stream of job status events.
    ///
    /// The stream ends when the server closes the connection.
    async fn open_status_stream(&self) -> Result<StatusStream, TransportError>;
}

/// Failure at the network boundary.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum TransportError {
    /// The request never got a response.
    #[display("connection failed: {message}")]
    Connection {
        /// Underlying cause.
        message: String,
    },
    /// The server answered with a non-success status.
    #[display("server returned {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Message extracted from the error body.
        message: String,
    },
    /// The response body did not have the expected shape.
    #[display("malformed response: {message}")]
    Decode {
        /// What was wrong with it.
        message: String,
    },
    /// The status stream ended.
    #[display("stream closed by server")]
    Closed,
}

impl TransportError {
    /// Connection failure.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "Transport connection error");
        Self::Connection { message }
    }

    /// Non-success status.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        error!(code, %message, "Server returned error status");
        Self::Status { code, message }
    }

    /// Undecodable body.
    pub fn decode(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "Failed to decode server response");
        Self::Decode { message }
    }

    /// Message suitable for a log line, without the error-kind prefix.
    pub fn reason(&self) -> String {
        match self {
            Self::Connection { message } | Self::Status { message, .. } | Self::Decode { message } => {
                message.clone()
            }
            Self::Closed => "stream closed by server".to_string(),
        }
    }
}
