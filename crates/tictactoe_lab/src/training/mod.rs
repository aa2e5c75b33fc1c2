//! Server-side training jobs.

mod client;
mod estimator;
mod job;
mod subscription;

pub use client::{TrainingCommand, TrainingEvent, TrainingJobClient};
pub use estimator::{Estimate, ProgressEstimator};
pub use job::{JobStatus, LogEntry, TrainingJob, TrainingParams};
pub use subscription::{StreamSignal, Subscription, SubscriptionSignal};

use derive_more::{Display, Error};
use tracing::error;

/// Training job failures.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum TrainingError {
    /// A job parameter was zero or negative.
    #[display("invalid training parameters: {message}")]
    InvalidParameters {
        /// Which parameter and why.
        message: String,
    },
    /// A job is already being submitted or running.
    #[display("a training job is already {status}")]
    AlreadyRunning {
        /// Status of the existing job.
        status: JobStatus,
    },
    /// Only submitting or running jobs can be cancelled.
    #[display("cannot cancel a job that is {status}")]
    NotCancellable {
        /// Status at the time of the attempt.
        status: JobStatus,
    },
    /// The server did not accept the job.
    #[display("training submission failed: {message}")]
    SubmissionFailed {
        /// Server or transport message.
        message: String,
    },
    /// The cancellation request did not go through.
    #[display("cancellation request failed: {message}")]
    CancellationFailed {
        /// Server or transport message.
        message: String,
    },
    /// The status stream dropped; it will be reopened.
    #[display("status stream disconnected: {message}")]
    StreamDisconnected {
        /// Transport message.
        message: String,
    },
    /// The server reported that training failed.
    #[display("training failed on the server: {message}")]
    RemoteTrainingError {
        /// Server message.
        message: String,
    },
    /// A status event could not be decoded.
    #[display("malformed status event: {message}")]
    MalformedEvent {
        /// Decode failure.
        message: String,
    },
    /// The model availability query failed.
    #[display("model status unavailable: {message}")]
    ModelStatusUnavailable {
        /// Server or transport message.
        message: String,
    },
}

impl TrainingError {
    /// Rejected parameters.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "Invalid training parameters");
        Self::InvalidParameters { message }
    }
}
