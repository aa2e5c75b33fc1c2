//! HTTP implementation of the network boundary.

use super::sse::SseDecoder;
use super::wire::ErrorBody;
use super::{
    JobRequest, MoveEndpoint, MoveReply, MoveRequest, MoveService, StatusEvent, StatusStream,
    TrainingService, TransportError,
};
use crate::config::LabConfig;
use crate::model::ModelAvailability;
use futures::StreamExt;
use std::collections::VecDeque;
use tracing::{debug, info, instrument, warn};

/// Talks to the game and training server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: LabConfig,
}

impl HttpBackend {
    /// Creates a backend for the configured server.
    #[instrument(skip(config), fields(server_url = %config.server_url()))]
    pub fn new(config: LabConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::connection(format!("Failed to build HTTP client: {}", e)))?;
        info!("HTTP backend ready");
        Ok(Self { client, config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    fn move_path(&self, endpoint: MoveEndpoint) -> &str {
        match endpoint {
            MoveEndpoint::Search => self.config.endpoints().minimax_move(),
            MoveEndpoint::Inference => self.config.endpoints().neural_move(),
        }
    }

    /// Turns a non-success response into [`TransportError::Status`].
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = ErrorBody::message_from(&text).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(TransportError::status(status.as_u16(), message))
    }

    async fn post_empty(&self, path: &str) -> Result<reqwest::Response, TransportError> {
        let url = self.config.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| TransportError::connection(format!("POST {} failed: {}", url, e)))?;
        Self::check_status(response).await
    }
}

#[async_trait::async_trait]
impl MoveService for HttpBackend {
    #[instrument(skip(self, request), fields(mover = %request.mover))]
    async fn request_move(
        &self,
        endpoint: MoveEndpoint,
        request: &MoveRequest,
    ) -> Result<MoveReply, TransportError> {
        let url = self.config.url(self.move_path(endpoint));
        debug!(%url, "Requesting move");

        let response = self
            .client
            .post(&url)
            .json(&request.body())
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| TransportError::connection(format!("POST {} failed: {}", url, e)))?;
        let response = Self::check_status(response).await?;

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::connection(format!("Failed to read response: {}", e)))?;
        debug!(response = %text, "Move response");

        serde_json::from_str(&text)
            .map_err(|e| TransportError::decode(format!("Invalid move response: {}", e)))
    }
}

#[async_trait::async_trait]
impl TrainingService for HttpBackend {
    #[instrument(skip(self))]
    async fn submit_job(&self, request: &JobRequest) -> Result<(), TransportError> {
        let url = self.config.url(self.config.endpoints().train());
        info!(%url, "Submitting training job");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(request)
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| TransportError::connection(format!("POST {} failed: {}", url, e)))?;
        Self::check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cancel_job(&self) -> Result<(), TransportError> {
        info!("Requesting training cancellation");
        self.post_empty(self.config.endpoints().train_cancel()).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn model_status(&self) -> Result<ModelAvailability, TransportError> {
        let url = self.config.url(self.config.endpoints().model_status());
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| TransportError::connection(format!("GET {} failed: {}", url, e)))?;
        let response = Self::check_status(response).await?;

        response
            .json::<ModelAvailability>()
            .await
            .map_err(|e| TransportError::decode(format!("Invalid model status: {}", e)))
    }

    #[instrument(skip(self))]
    async fn open_status_stream(&self) -> Result<StatusStream, TransportError> {
        let url = self.config.url(self.config.endpoints().train_status());
        info!(%url, "Opening status stream");

        // No request timeout here: the stream stays open for the whole job.
        let response = self
            .client
            .get(&url)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| TransportError::connection(format!("GET {} failed: {}", url, e)))?;
        let response = Self::check_status(response).await?;

        let state = StreamState {
            response,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };
        Ok(futures::stream::unfold(state, next_event).boxed())
    }
}

struct StreamState {
    response: reqwest::Response,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

async fn next_event(
    mut state: StreamState,
) -> Option<(Result<StatusEvent, TransportError>, StreamState)> {
    loop {
        if let Some(data) = state.pending.pop_front() {
            return Some((StatusEvent::parse(&data), state));
        }
        if state.finished {
            return None;
        }
        match state.response.chunk().await {
            Ok(Some(bytes)) => {
                let events = state.decoder.push(&bytes);
                state.pending.extend(events);
            }
            Ok(None) => {
                debug!("Status stream ended");
                state.finished = true;
                state.pending.extend(state.decoder.finish());
            }
            Err(e) => {
                warn!(error = %e, "Status stream read failed");
                state.finished = true;
                return Some((
                    Err(TransportError::connection(format!("Stream read failed: {}", e))),
                    state,
                ));
            }
        }
    }
}
