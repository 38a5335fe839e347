use thiserror::Error;

pub type Result<T> = std::result::Result<T, SensorError>;

/// Virtual sensor errors
///
/// This enum provides specific error variants for configuration, identity,
/// transport, and lifecycle failures.
///
/// # Error Categories
///
/// - **Configuration**: `Config` - invalid or missing settings, fatal at startup
/// - **Identity**: `Auth` - the provider rejected or failed the token request
/// - **Transport**: `Transport` - broker connection and publish failures
/// - **Lifecycle**: `AlreadyActive` - start called on a running sensor
/// - **Encoding**: `Serialization` - envelope could not be rendered as JSON
///
/// # Examples
///
/// ```
/// use virtual_sensor::{Result, SensorError};
///
/// fn require_topic(topic: &str) -> Result<()> {
///     if topic.is_empty() {
///         return Err(SensorError::Transport("empty topic".to_string()));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum SensorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Sensor is already active")]
    AlreadyActive,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Invalid or incomplete startup configuration
///
/// Carries every offending setting so one failed startup reports all
/// problems at once instead of one per run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration: {}", problems.join("; "))]
pub struct ConfigError {
    /// Human-readable descriptions of each offending setting
    pub problems: Vec<String>,
}

impl ConfigError {
    #[must_use]
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }
}

/// Identity-provider failures
///
/// Every failure mode of the token request is captured as a value; the
/// authentication call itself never panics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider answered and refused the credentials
    #[error("provider rejected the request: {kind}: {message}")]
    Rejected { kind: String, message: String },

    /// The request never completed (connect failure, broken stream)
    #[error("token request failed: {0}")]
    Request(String),

    /// The provider answered with a body this client cannot interpret
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SensorError {
    fn from(err: serde_json::Error) -> Self {
        SensorError::Serialization(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for SensorError {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        SensorError::Transport(format!("Channel send error: {err}"))
    }
}
