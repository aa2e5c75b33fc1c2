//! Client configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Environment variable overriding [`LabConfig::server_url`].
pub const SERVER_URL_ENV: &str = "TICTACTOE_LAB_SERVER_URL";

/// Configuration for talking to the game and training server.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct LabConfig {
    /// Base URL of the server (e.g., "http://localhost:5001").
    #[serde(default = "default_server_url")]
    server_url: String,

    /// Timeout for one-shot requests (moves, submission, cancellation).
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Delay before reopening a dropped status stream.
    #[serde(default = "default_reconnect_delay_ms")]
    reconnect_delay_ms: u64,

    /// Endpoint paths, relative to `server_url`.
    #[serde(default)]
    endpoints: EndpointPaths,

    /// Defaults for new training jobs.
    #[serde(default)]
    training: TrainingDefaults,
}

fn default_server_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

/// Server routes.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    /// Remote-search (minimax) move.
    minimax_move: String,
    /// Remote-inference (trained network) move.
    neural_move: String,
    /// Job submission.
    train: String,
    /// Server-Sent Events status stream.
    train_status: String,
    /// Job cancellation.
    train_cancel: String,
    /// Model availability query.
    model_status: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            minimax_move: "/api/move/minimax".to_string(),
            neural_move: "/api/move/neural-network".to_string(),
            train: "/api/train".to_string(),
            train_status: "/api/train/status".to_string(),
            train_cancel: "/api/train/cancel".to_string(),
            model_status: "/api/model/status".to_string(),
        }
    }
}

/// Values used when the user does not pick training parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingDefaults {
    /// Generations to evolve.
    generations: i64,
    /// Games played per individual each generation.
    games: i64,
    /// Individuals per generation.
    population_size: i64,
}

impl Default for TrainingDefaults {
    fn default() -> Self {
        Self {
            generations: 10,
            games: 10,
            population_size: 10,
        }
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_secs: default_request_timeout_secs(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            endpoints: EndpointPaths::default(),
            training: TrainingDefaults::default(),
        }
    }
}

impl LabConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(server_url = %config.server_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if it exists, otherwise falls back to defaults, then
    /// applies the environment override.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Applies `TICTACTOE_LAB_SERVER_URL` if set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(SERVER_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                info!(server_url = %url, "Server URL overridden from environment");
                self.with_server_url(url)
            }
            _ => self,
        }
    }

    /// Replaces the server URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Joins the server URL with an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Timeout for one-shot requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before a dropped status stream is reopened.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::new("server_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::new(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "Config error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: LabConfig = toml::from_str("").unwrap();
        assert_eq!(config, LabConfig::default());
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_tables_keep_remaining_defaults() {
        let config: LabConfig = toml::from_str(
            r#"
server_url = "http://trainer:9000/"

[endpoints]
train = "/v2/train"

[training]
generations = 40
"#,
        )
        .unwrap();

        assert_eq!(config.url(config.endpoints().train()), "http://trainer:9000/v2/train");
        assert_eq!(config.endpoints().train_status(), "/api/train/status");
        assert_eq!(*config.training().generations(), 40);
        assert_eq!(*config.training().population_size(), 10);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = LabConfig::default().with_server_url("http://host:1/");
        assert_eq!(config.url("/api/train"), "http://host:1/api/train");
        assert_eq!(config.url("api/train"), "http://host:1/api/train");
    }
}
