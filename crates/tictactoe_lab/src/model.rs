//! Process-wide model availability.
//!
//! One writer publishes, any number of readers observe. The trained-agent
//! move provider reads it before every request.

use crate::transport::{TrainingService, TransportError};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Whether a trained model is available on the server.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelAvailability {
    /// A trained model is loaded and can produce moves.
    #[serde(default)]
    pub loaded: bool,
    /// Fitness of the loaded model.
    #[serde(default)]
    pub best_fitness: f64,
}

impl ModelAvailability {
    /// Availability after a completed training job.
    pub fn trained(best_fitness: f64) -> Self {
        Self {
            loaded: true,
            best_fitness,
        }
    }
}

/// Creates the single writer and a reader for the shared availability cell.
pub fn model_availability_channel() -> (ModelAvailabilityWriter, ModelAvailabilityReader) {
    let (tx, rx) = watch::channel(ModelAvailability::default());
    (ModelAvailabilityWriter { tx }, ModelAvailabilityReader { rx })
}

/// Sole writer of [`ModelAvailability`].
#[derive(Debug)]
pub struct ModelAvailabilityWriter {
    tx: watch::Sender<ModelAvailability>,
}

impl ModelAvailabilityWriter {
    /// Publishes a new value; returns `true` when it differs from the old one.
    #[instrument(skip(self))]
    pub fn publish(&self, availability: ModelAvailability) -> bool {
        let previous = self.tx.send_replace(availability);
        let changed = previous != availability;
        if changed {
            info!(
                loaded = availability.loaded,
                best_fitness = availability.best_fitness,
                "Model availability changed"
            );
        }
        changed
    }

    /// Queries the server and publishes the answer.
    ///
    /// On failure the previous value is kept.
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        service: &dyn TrainingService,
    ) -> Result<(ModelAvailability, bool), TransportError> {
        let availability = service.model_status().await.map_err(|e| {
            warn!(error = %e, "Model status query failed");
            e
        })?;
        let changed = self.publish(availability);
        Ok((availability, changed))
    }

    /// Current value.
    pub fn current(&self) -> ModelAvailability {
        *self.tx.borrow()
    }

    /// New reader for the same cell.
    pub fn reader(&self) -> ModelAvailabilityReader {
        ModelAvailabilityReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read handle for [`ModelAvailability`].
#[derive(Debug, Clone)]
pub struct ModelAvailabilityReader {
    rx: watch::Receiver<ModelAvailability>,
}

impl ModelAvailabilityReader {
    /// Current value.
    pub fn current(&self) -> ModelAvailability {
        *self.rx.borrow()
    }

    /// Shorthand for `current().loaded`.
    pub fn is_loaded(&self) -> bool {
        self.rx.borrow().loaded
    }
}
