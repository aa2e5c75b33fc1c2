//! In-memory fakes of the server.

#![allow(dead_code)]

use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tictactoe_lab::{
    JobRequest, ModelAvailability, MoveEndpoint, MoveReply, MoveRequest, MoveService, StatusEvent,
    StatusStream, TrainingService, TransportError,
};
use tokio::sync::{mpsc, Semaphore};

/// Scripted move server.
#[derive(Default)]
pub struct FakeMoveService {
    replies: Mutex<VecDeque<Result<MoveReply, TransportError>>>,
    endpoints: Mutex<Vec<MoveEndpoint>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeMoveService {
    /// Answers immediately with the scripted replies.
    pub fn new(replies: Vec<Result<MoveReply, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    /// Holds every reply until a permit is added to the returned gate.
    pub fn gated(replies: Vec<Result<MoveReply, TransportError>>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let service = Arc::new(Self {
            replies: Mutex::new(replies.into()),
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        });
        (service, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn endpoints(&self) -> Vec<MoveEndpoint> {
        self.endpoints.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MoveService for FakeMoveService {
    async fn request_move(
        &self,
        endpoint: MoveEndpoint,
        _request: &MoveRequest,
    ) -> Result<MoveReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().unwrap().push(endpoint);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::connection("no scripted reply")))
    }
}

/// Items of one scripted status stream.
pub type StreamScript = Vec<Result<StatusEvent, TransportError>>;

/// Scripted training server.
///
/// Each `open_status_stream` call takes the next script; once they run out
/// the stream stays open without sending anything, unless an exhausted
/// error was set.
pub struct FakeTrainingService {
    submit_results: Mutex<VecDeque<Result<(), TransportError>>>,
    cancel_results: Mutex<VecDeque<Result<(), TransportError>>>,
    model_status: Mutex<Result<ModelAvailability, TransportError>>,
    streams: Mutex<VecDeque<Result<StreamScript, TransportError>>>,
    exhausted: Option<TransportError>,
    submitted: Mutex<Vec<JobRequest>>,
    cancels: AtomicUsize,
    opens: AtomicUsize,
}

impl Default for FakeTrainingService {
    fn default() -> Self {
        Self {
            submit_results: Mutex::default(),
            cancel_results: Mutex::default(),
            model_status: Mutex::new(Ok(ModelAvailability::default())),
            streams: Mutex::default(),
            exhausted: None,
            submitted: Mutex::default(),
            cancels: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
        }
    }
}

impl FakeTrainingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(self, stream: Result<StreamScript, TransportError>) -> Self {
        self.streams.lock().unwrap().push_back(stream);
        self
    }

    /// Fails every open once the scripts run out.
    pub fn with_streams_failing(self, error: TransportError) -> Self {
        Self {
            exhausted: Some(error),
            ..self
        }
    }

    pub fn with_submit_result(self, result: Result<(), TransportError>) -> Self {
        self.submit_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_cancel_result(self, result: Result<(), TransportError>) -> Self {
        self.cancel_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_model_status(self, status: Result<ModelAvailability, TransportError>) -> Self {
        *self.model_status.lock().unwrap() = status;
        self
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TrainingService for FakeTrainingService {
    async fn submit_job(&self, request: &JobRequest) -> Result<(), TransportError> {
        self.submitted.lock().unwrap().push(*request);
        self.submit_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn cancel_job(&self) -> Result<(), TransportError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancel_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn model_status(&self) -> Result<ModelAvailability, TransportError> {
        self.model_status.lock().unwrap().clone()
    }

    async fn open_status_stream(&self) -> Result<StatusStream, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.streams.lock().unwrap().pop_front() {
            Some(Ok(items)) => Ok(futures::stream::iter(items).boxed()),
            Some(Err(e)) => Err(e),
            None => match &self.exhausted {
                Some(e) => Err(e.clone()),
                None => Ok(futures::stream::pending().boxed()),
            },
        }
    }
}

/// Parses a status event from JSON.
pub fn event(json: &str) -> StatusEvent {
    StatusEvent::parse(json).unwrap()
}

/// Everything queued on a channel right now.
pub fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}
