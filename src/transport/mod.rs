//! Broker transport seam
//!
//! [`BrokerTransport`] is the surface the publish workflow sees: connect
//! once, publish readings, observe the connection through an event stream.
//! The MQTT implementation lives in [`mqtt`]; [`mock`] provides a recorded
//! double for tests.

pub mod mock;
pub mod mqtt;

use crate::error::Result;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

pub use mock::{MockCall, MockTransport};
pub use mqtt::MqttTransport;

/// Connection events surfaced by a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Broker acknowledged the connection
    Connected {
        /// Session present flag from the acknowledgment
        session_present: bool,
    },
    /// Connection closed
    Disconnected {
        /// Reason for disconnection
        reason: DisconnectReason,
    },
    /// Connection-level fault; the session may recover on its own
    Error {
        /// Human-readable description
        message: String,
    },
}

/// Reasons for disconnection
#[derive(Debug, Clone)]
pub enum DisconnectReason {
    /// Client initiated disconnect
    ClientInitiated,
    /// Server closed connection
    ServerClosed,
    /// Network error
    NetworkError(String),
}

/// Boxed future returned by the transport seam
///
/// Boxing keeps the futures `Send` when awaited through a generic
/// transport parameter; bare `impl Future` returns here trip the
/// known `Send`-inference limitation (rustc #100013) at every spawn
/// site of the publish workflow.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Long-lived broker session with an event stream
pub trait BrokerTransport {
    /// Opens the broker session and yields the connection event stream
    ///
    /// The stream ends when the session is torn down; a closed stream means
    /// no further events will ever arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened.
    fn connect(&self) -> BoxFuture<'_, Result<mpsc::Receiver<TransportEvent>>>;

    /// Publishes a payload to a topic, fire-and-forget
    ///
    /// # Errors
    ///
    /// Returns an error if the publish cannot be handed to the broker
    /// session.
    fn publish<'a>(
        &'a self,
        topic: impl Into<String> + Send + 'a,
        payload: impl Into<Vec<u8>> + Send + 'a,
    ) -> BoxFuture<'a, Result<()>>;

    /// Tears down the broker session
    ///
    /// # Errors
    ///
    /// Returns an error if the teardown could not be initiated.
    fn disconnect(&self) -> BoxFuture<'_, Result<()>>;
}
