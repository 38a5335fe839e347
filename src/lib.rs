//! # Virtual Sensor
//!
//! A network-connected telemetry sensor simulator. It connects to an MQTT
//! broker, trades Cognito credentials for an access token, and publishes a
//! randomized temperature and distance reading every few seconds, each one
//! wrapped in an envelope carrying the token.
//!
//! ## Example
//!
//! ```rust,no_run
//! use virtual_sensor::{Config, PublishOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> virtual_sensor::Result<()> {
//!     let config = Config::from_env()?;
//!     let orchestrator = PublishOrchestrator::new(config)?;
//!     orchestrator.run().await
//! }
//! ```

#![warn(clippy::pedantic)]

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod orchestrator;
pub mod sample;
pub mod sensor;
pub mod transport;

pub use auth::{
    AuthOutcome, AuthSession, BearerToken, CognitoProvider, Credentials, IdentityProvider,
    MockIdentityProvider, ProviderCall,
};
pub use config::{BrokerEndpoint, Config, ScriptMode, UserPool};
pub use error::{AuthError, ConfigError, Result, SensorError};
pub use orchestrator::PublishOrchestrator;
pub use sample::{Envelope, Metadata, MetricValue, PayloadField, PayloadFields, Reading};
pub use sensor::VirtualSensor;
pub use transport::{
    BoxFuture, BrokerTransport, DisconnectReason, MockCall, MockTransport, MqttTransport,
    TransportEvent,
};
