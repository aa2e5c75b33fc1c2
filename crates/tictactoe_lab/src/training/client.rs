//! Training job lifecycle.

use super::estimator::ProgressEstimator;
use super::job::{JobStatus, TrainingJob, TrainingParams};
use super::subscription::{StreamSignal, Subscription, SubscriptionSignal};
use super::TrainingError;
use crate::model::{ModelAvailability, ModelAvailabilityWriter};
use crate::transport::{StatusEvent, TrainingService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    /// The job changed.
    Changed(TrainingJob),
    /// An operation failed or the server reported a failure.
    Error(TrainingError),
    /// Model availability changed.
    ModelAvailabilityChanged(ModelAvailability),
}

/// Requests from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingCommand {
    /// Submit a new job.
    Submit(TrainingParams),
    /// Ask the server to stop the running job.
    Cancel,
    /// Drop the current job and go back to idle.
    Reset,
    /// Query model availability.
    RefreshModel,
}

/// Submits a training job and follows it to a terminal state.
///
/// Terminal status events are applied once; anything that arrives for a
/// finished job, or for a job that has been replaced, is ignored.
pub struct TrainingJobClient {
    service: Arc<dyn TrainingService>,
    model: ModelAvailabilityWriter,
    retry_delay: Duration,
    events: mpsc::UnboundedSender<TrainingEvent>,
    job: TrainingJob,
    next_job_id: u64,
    started: Option<Instant>,
    estimator: ProgressEstimator,
    subscription: Option<Subscription>,
    signal_tx: mpsc::UnboundedSender<SubscriptionSignal>,
    signal_rx: mpsc::UnboundedReceiver<SubscriptionSignal>,
}

impl TrainingJobClient {
    /// Creates an idle client.
    pub fn new(
        service: Arc<dyn TrainingService>,
        model: ModelAvailabilityWriter,
        retry_delay: Duration,
        events: mpsc::UnboundedSender<TrainingEvent>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        Self {
            service,
            model,
            retry_delay,
            events,
            job: TrainingJob::idle(),
            next_job_id: 1,
            started: None,
            estimator: ProgressEstimator::new(),
            subscription: None,
            signal_tx,
            signal_rx,
        }
    }

    /// Current job.
    pub fn job(&self) -> &TrainingJob {
        &self.job
    }

    /// Current job status.
    pub fn status(&self) -> JobStatus {
        *self.job.status()
    }

    /// Last published model availability.
    pub fn model(&self) -> ModelAvailability {
        self.model.current()
    }

    /// Whether a status subscription is open.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Submits a job and, once accepted, subscribes to its status stream.
    #[instrument(skip(self))]
    pub async fn submit(&mut self, params: TrainingParams) -> Result<(), TrainingError> {
        let status = self.status();
        if !status.accepts_submission() {
            return Err(self.fail(TrainingError::AlreadyRunning { status }));
        }
        let request = match params.validate() {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e)),
        };

        self.close_subscription();
        let id = self.next_job_id;
        self.next_job_id += 1;
        self.job = TrainingJob::submitting(id, &request);
        self.started = Some(Instant::now());
        self.estimator.reset();
        self.job.push_log(format!(
            "Starting training: {} generations, {} games, population {}",
            request.generations, request.games, request.population_size
        ));
        info!(job_id = id, "Submitting training job");
        self.publish_job();

        if let Err(e) = self.service.submit_job(&request).await {
            let message = e.reason();
            self.job.set_status(JobStatus::Error);
            self.job.push_log(format!("Submission failed: {}", message));
            self.publish_job();
            return Err(self.fail(TrainingError::SubmissionFailed { message }));
        }

        self.job.set_status(JobStatus::Running);
        self.job.push_log("Training job accepted");
        info!(job_id = id, "Training job running");
        self.publish_job();

        self.subscription = Some(Subscription::open(
            Arc::clone(&self.service),
            id,
            self.retry_delay,
            self.signal_tx.clone(),
        ));
        Ok(())
    }

    /// Asks the server to cancel the job.
    ///
    /// The job stays in its current state; the status stream reports the
    /// cancellation.
    #[instrument(skip(self))]
    pub async fn cancel(&mut self) -> Result<(), TrainingError> {
        let status = self.status();
        if !status.is_cancellable() {
            return Err(self.fail(TrainingError::NotCancellable { status }));
        }

        self.job.push_log("Cancellation requested");
        self.publish_job();

        match self.service.cancel_job().await {
            Ok(()) => {
                info!("Cancellation accepted");
                self.job.push_log("Cancellation accepted, waiting for the server to stop");
                self.publish_job();
                Ok(())
            }
            Err(e) => {
                let message = e.reason();
                self.job.push_log(format!("Cancellation failed: {}", message));
                self.publish_job();
                Err(self.fail(TrainingError::CancellationFailed { message }))
            }
        }
    }

    /// Queries the server for model availability and publishes the answer.
    #[instrument(skip(self))]
    pub async fn refresh_model_availability(&mut self) -> Result<ModelAvailability, TrainingError> {
        match self.model.refresh(self.service.as_ref()).await {
            Ok((availability, changed)) => {
                if changed {
                    self.notify(TrainingEvent::ModelAvailabilityChanged(availability));
                }
                Ok(availability)
            }
            Err(e) => Err(self.fail(TrainingError::ModelStatusUnavailable { message: e.reason() })),
        }
    }

    /// Drops the current job and its subscription.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.close_subscription();
        self.job = TrainingJob::idle();
        self.started = None;
        self.estimator.reset();
        info!("Training client reset");
        self.publish_job();
    }

    /// Waits for the next subscription signal.
    pub async fn next_signal(&mut self) -> Option<SubscriptionSignal> {
        self.signal_rx.recv().await
    }

    /// Applies one subscription signal.
    #[instrument(skip(self, signal), fields(job_id = signal.job_id))]
    pub async fn handle_signal(&mut self, signal: SubscriptionSignal) {
        if signal.job_id != *self.job.id() {
            debug!(current = *self.job.id(), "Ignoring signal from a replaced job");
            return;
        }

        match signal.kind {
            StreamSignal::Opened => {
                if self.status().is_terminal() {
                    return;
                }
                self.job.push_log("Connected to training stream");
                self.publish_job();
            }
            StreamSignal::Event(event) => self.handle_event(event).await,
            StreamSignal::Malformed(message) => {
                warn!(%message, "Malformed status event");
                self.job.push_log(format!("Malformed status event: {}", message));
                self.publish_job();
                self.fail(TrainingError::MalformedEvent { message });
            }
            StreamSignal::Disconnected { reason, retry_in } => {
                if self.status().is_terminal() || self.subscription.is_none() {
                    debug!(%reason, "Ignoring disconnect of a closed subscription");
                    return;
                }
                let disconnected = TrainingError::StreamDisconnected { message: reason };
                info!(%disconnected, ?retry_in, "Waiting to reconnect");
                self.job.push_log(format!(
                    "{}, reconnecting in {}s",
                    disconnected,
                    retry_in.as_secs_f64()
                ));
                self.publish_job();
            }
        }
    }

    /// Waits for and applies the next signal. Returns `false` if none can arrive.
    pub async fn process_next(&mut self) -> bool {
        match self.next_signal().await {
            Some(signal) => {
                self.handle_signal(signal).await;
                true
            }
            None => false,
        }
    }

    /// Handles one presentation command.
    pub async fn handle_command(&mut self, command: TrainingCommand) -> Result<(), TrainingError> {
        match command {
            TrainingCommand::Submit(params) => self.submit(params).await,
            TrainingCommand::Cancel => self.cancel().await,
            TrainingCommand::Reset => {
                self.reset();
                Ok(())
            }
            TrainingCommand::RefreshModel => self.refresh_model_availability().await.map(|_| ()),
        }
    }

    /// Refreshes model availability, then serves commands and stream signals
    /// until the command sender is dropped.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<TrainingCommand>) {
        info!("Training client running");
        if let Err(e) = self.refresh_model_availability().await {
            debug!(error = %e, "Initial model status check failed");
        }
        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                Some(signal) = self.signal_rx.recv() => Step::Signal(signal),
            };
            match step {
                Step::Command(Some(command)) => {
                    if let Err(e) = self.handle_command(command).await {
                        debug!(error = %e, "Command failed");
                    }
                }
                Step::Command(None) => break,
                Step::Signal(signal) => self.handle_signal(signal).await,
            }
        }
        self.close_subscription();
        info!("Training client stopped");
    }

    async fn handle_event(&mut self, event: StatusEvent) {
        let status = self.status();
        if status.is_terminal() {
            warn!(%status, ?event, "Ignoring event for a finished job");
            return;
        }
        let payload = event.payload().clone();
        self.job.apply_payload(&payload);

        match event {
            StatusEvent::Training(_) => {
                self.update_estimate(payload.progress);
                if let Some(message) = payload.message {
                    self.job.push_log(message);
                }
                self.publish_job();
            }
            StatusEvent::Completed(_) => {
                self.update_estimate(Some(1.0));
                self.finish(JobStatus::Completed, payload.message, "Training completed");
                let availability = ModelAvailability::trained(*self.job.best_fitness());
                if self.model.publish(availability) {
                    self.notify(TrainingEvent::ModelAvailabilityChanged(availability));
                }
                if let Err(e) = self.refresh_model_availability().await {
                    debug!(error = %e, "Follow-up model status check failed");
                }
            }
            StatusEvent::Error(_) => {
                let message = payload
                    .message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                self.finish(JobStatus::Error, Some(format!("Training error: {}", message)), "");
                self.fail(TrainingError::RemoteTrainingError { message });
            }
            StatusEvent::Cancelled(_) => {
                self.finish(JobStatus::Cancelled, payload.message, "Training cancelled");
            }
        }
    }

    fn finish(&mut self, status: JobStatus, message: Option<String>, fallback: &str) {
        self.close_subscription();
        self.job.set_status(status);
        self.job.push_log(message.unwrap_or_else(|| fallback.to_string()));
        info!(job_id = *self.job.id(), %status, "Training job finished");
        self.publish_job();
    }

    fn update_estimate(&mut self, progress: Option<f64>) {
        let Some(started) = self.started else {
            return;
        };
        let elapsed = started.elapsed();
        self.job.set_elapsed(elapsed);
        if let Some(estimate) = progress.and_then(|p| self.estimator.observe(p, elapsed)) {
            self.job.set_remaining(estimate.remaining);
        }
    }

    fn close_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
    }

    fn publish_job(&self) {
        self.notify(TrainingEvent::Changed(self.job.clone()));
    }

    fn fail(&self, error: TrainingError) -> TrainingError {
        warn!(%error, "Training error");
        self.notify(TrainingEvent::Error(error.clone()));
        error
    }

    fn notify(&self, event: TrainingEvent) {
        if self.events.send(event).is_err() {
            debug!("No listener for training events");
        }
    }
}

enum Step {
    Command(Option<TrainingCommand>),
    Signal(SubscriptionSignal),
}
