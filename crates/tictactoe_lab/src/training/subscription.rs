//! Reconnecting status stream subscription.

use crate::transport::{StatusEvent, TrainingService, TransportError};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Something the subscription observed, tagged with the job it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSignal {
    /// Job the subscription was opened for.
    pub job_id: u64,
    /// What happened.
    pub kind: StreamSignal,
}

/// Stream lifecycle and payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    /// The stream was (re)opened.
    Opened,
    /// A decoded status event.
    Event(StatusEvent),
    /// A payload that could not be decoded.
    Malformed(String),
    /// The stream failed or ended; it will be reopened after `retry_in`.
    Disconnected {
        /// Transport message.
        reason: String,
        /// Delay before the next attempt.
        retry_in: Duration,
    },
}

/// A live subscription to the job status stream.
///
/// A background task keeps the stream open, reopening it after every
/// disconnect, until a terminal event arrives or the handle is closed or
/// dropped.
#[derive(Debug)]
pub struct Subscription {
    job_id: u64,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Starts the background task.
    #[instrument(skip(service, signals))]
    pub fn open(
        service: Arc<dyn TrainingService>,
        job_id: u64,
        retry_delay: Duration,
        signals: mpsc::UnboundedSender<SubscriptionSignal>,
    ) -> Self {
        info!("Opening status subscription");
        let task = tokio::spawn(follow_stream(service, job_id, retry_delay, signals));
        Self { job_id, task }
    }

    /// Tears the subscription down; no reconnect is attempted afterwards.
    pub fn close(self) {
        debug!(job_id = self.job_id, "Closing status subscription");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow_stream(
    service: Arc<dyn TrainingService>,
    job_id: u64,
    retry_delay: Duration,
    signals: mpsc::UnboundedSender<SubscriptionSignal>,
) {
    let send = |kind: StreamSignal| signals.send(SubscriptionSignal { job_id, kind }).is_ok();

    loop {
        let reason = match service.open_status_stream().await {
            Ok(mut stream) => {
                if !send(StreamSignal::Opened) {
                    return;
                }
                loop {
                    match stream.next().await {
                        Some(Ok(event)) => {
                            let terminal = event.is_terminal();
                            if !send(StreamSignal::Event(event)) {
                                return;
                            }
                            if terminal {
                                debug!(job_id, "Terminal event received, subscription done");
                                return;
                            }
                        }
                        Some(Err(TransportError::Decode { message })) => {
                            if !send(StreamSignal::Malformed(message)) {
                                return;
                            }
                        }
                        Some(Err(e)) => break e.reason(),
                        None => break TransportError::Closed.reason(),
                    }
                }
            }
            Err(e) => e.reason(),
        };

        warn!(job_id, %reason, ?retry_delay, "Status stream lost, will reconnect");
        if !send(StreamSignal::Disconnected {
            reason,
            retry_in: retry_delay,
        }) {
            return;
        }
        tokio::time::sleep(retry_delay).await;
    }
}
