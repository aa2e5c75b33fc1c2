//! Tic-tac-toe against remote agents, and the training jobs behind them.
//!
//! [`SessionController`] runs a game: it applies the human's moves, asks a
//! [`MoveProvider`] for the agent's reply and reports every change as a
//! [`SessionEvent`]. [`TrainingJobClient`] submits a training job, follows
//! the server's status stream (reconnecting when it drops) and publishes
//! [`ModelAvailability`] once a model is trained.
//!
//! Both talk to the server through the [`MoveService`] and
//! [`TrainingService`] traits; [`HttpBackend`] implements them over HTTP.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod model;
mod providers;
mod session;
mod training;
mod transport;

pub mod cli;
pub mod console;

pub use config::{ConfigError, EndpointPaths, LabConfig, TrainingDefaults, SERVER_URL_ENV};
pub use model::{
    model_availability_channel, ModelAvailability, ModelAvailabilityReader,
    ModelAvailabilityWriter,
};
pub use providers::{
    GameMode, LocalRandom, MoveProvider, ProviderError, ProviderKind, Providers, RemoteInference,
    RemoteSearch,
};
pub use session::{
    AiMoveOutcome, GameSession, GameStatus, SessionCommand, SessionController, SessionError,
    SessionEvent, SessionState,
};
pub use training::{
    Estimate, JobStatus, LogEntry, ProgressEstimator, StreamSignal, Subscription,
    SubscriptionSignal, TrainingCommand, TrainingError, TrainingEvent, TrainingJob,
    TrainingJobClient, TrainingParams,
};
pub use transport::{
    encode_board, HttpBackend, JobRequest, MoveEndpoint, MoveReply, MoveRequest, MoveRequestBody,
    MoveService, SseDecoder, StatusEvent, StatusPayload, StatusStream, TrainingService,
    TransportError,
};
