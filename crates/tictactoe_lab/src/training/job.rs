//! Training job state.

use super::TrainingError;
use crate::config::TrainingDefaults;
use crate::transport::{JobRequest, StatusPayload};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::Display;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of a training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum JobStatus {
    /// No job.
    #[display("idle")]
    Idle,
    /// Submission request in progress.
    #[display("submitting")]
    Submitting,
    /// Accepted by the server.
    #[display("running")]
    Running,
    /// Finished and produced a model.
    #[display("completed")]
    Completed,
    /// Failed.
    #[display("error")]
    Error,
    /// Stopped at the user's request.
    #[display("cancelled")]
    Cancelled,
}

impl JobStatus {
    /// Completed, Error or Cancelled.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    /// A new job may be submitted.
    pub fn accepts_submission(self) -> bool {
        self == Self::Idle || self.is_terminal()
    }

    /// A cancellation request makes sense.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Submitting | Self::Running)
    }
}

/// One line of the job log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the line was recorded.
    pub at: DateTime<Utc>,
    /// Text.
    pub message: String,
}

/// Parameters chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Generations to evolve.
    pub generations: i64,
    /// Games per individual each generation.
    pub games: i64,
    /// Individuals per generation.
    pub population_size: i64,
}

impl TrainingParams {
    /// Checks that every parameter is positive and builds the request.
    pub fn validate(&self) -> Result<JobRequest, TrainingError> {
        for (name, value) in [
            ("generations", self.generations),
            ("games", self.games),
            ("population_size", self.population_size),
        ] {
            if value <= 0 {
                return Err(TrainingError::invalid_parameters(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(JobRequest {
            generations: self.generations,
            games: self.games,
            population_size: self.population_size,
        })
    }
}

impl From<TrainingDefaults> for TrainingParams {
    fn from(defaults: TrainingDefaults) -> Self {
        Self::new(
            *defaults.generations(),
            *defaults.games(),
            *defaults.population_size(),
        )
    }
}

/// Snapshot of one training job as reported to the presentation layer.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct TrainingJob {
    /// Job identity, increasing with every submission.
    id: u64,
    /// Lifecycle status.
    status: JobStatus,
    /// Last finished generation.
    generation: u32,
    /// Generations requested.
    total_generations: u32,
    /// Fraction complete, clamped to `0.0..=1.0`.
    progress: f64,
    /// Best fitness so far.
    best_fitness: f64,
    /// Fitness of the latest generation.
    current_fitness: f64,
    /// Games per individual.
    games: i64,
    /// Individuals per generation.
    population_size: i64,
    /// When the job was submitted.
    started_at: Option<DateTime<Utc>>,
    /// Time since submission at the last update.
    elapsed: Duration,
    /// Projected time to completion.
    remaining: Option<Duration>,
    /// Log lines in arrival order.
    log: Vec<LogEntry>,
}

impl Default for TrainingJob {
    fn default() -> Self {
        Self::idle()
    }
}

impl TrainingJob {
    /// The empty job shown before anything was submitted.
    pub fn idle() -> Self {
        Self {
            id: 0,
            status: JobStatus::Idle,
            generation: 0,
            total_generations: 0,
            progress: 0.0,
            best_fitness: 0.0,
            current_fitness: 0.0,
            games: 0,
            population_size: 0,
            started_at: None,
            elapsed: Duration::ZERO,
            remaining: None,
            log: Vec::new(),
        }
    }

    /// A job whose submission is about to be sent.
    pub(crate) fn submitting(id: u64, request: &JobRequest) -> Self {
        Self {
            id,
            status: JobStatus::Submitting,
            total_generations: u32::try_from(request.generations).unwrap_or(u32::MAX),
            games: request.games,
            population_size: request.population_size,
            started_at: Some(Utc::now()),
            ..Self::idle()
        }
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub(crate) fn set_remaining(&mut self, remaining: Duration) {
        self.remaining = Some(remaining);
    }

    pub(crate) fn push_log(&mut self, message: impl Into<String>) {
        self.log.push(LogEntry {
            at: Utc::now(),
            message: message.into(),
        });
    }

    /// Copies whatever the event carries; absent fields keep their value.
    pub(crate) fn apply_payload(&mut self, payload: &StatusPayload) {
        if let Some(generation) = payload.generation {
            self.generation = generation;
        }
        if let Some(total) = payload.total_generations {
            self.total_generations = total;
        }
        if let Some(progress) = payload.progress.filter(|p| p.is_finite()) {
            self.progress = progress.clamp(0.0, 1.0);
        }
        if let Some(best) = payload.best_fitness.filter(|f| f.is_finite()) {
            self.best_fitness = best.max(0.0);
        }
        if let Some(current) = payload.current_fitness.filter(|f| f.is_finite()) {
            self.current_fitness = current.max(0.0);
        }
    }

    /// Most recent log line.
    pub fn last_log(&self) -> Option<&LogEntry> {
        self.log.last()
    }
}
