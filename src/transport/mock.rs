//! Mock broker transport for testing
//!
//! Records every call and lets tests drive the event stream by hand.
//! Clones share state, so a test can keep one handle while the code
//! under test owns another.

use crate::error::{Result, SensorError};
use crate::transport::{BoxFuture, BrokerTransport, DisconnectReason, TransportEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

/// A recorded call on the mock transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect,
    Publish { topic: String, payload: Vec<u8> },
    Disconnect,
}

#[derive(Default)]
struct MockResponses {
    connect_error: Option<SensorError>,
    publish_response: Option<Result<()>>,
    disconnect_response: Option<Result<()>>,
}

struct MockState {
    connected: AtomicBool,
    calls: Mutex<Vec<MockCall>>,
    responses: RwLock<MockResponses>,
    event_tx: Mutex<Option<mpsc::Sender<TransportEvent>>>,
}

/// Mock implementation of [`BrokerTransport`]
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                connected: AtomicBool::new(false),
                calls: Mutex::new(Vec::new()),
                responses: RwLock::new(MockResponses::default()),
                event_tx: Mutex::new(None),
            }),
        }
    }

    /// Get all recorded calls
    pub async fn get_calls(&self) -> Vec<MockCall> {
        self.state.calls.lock().await.clone()
    }

    /// Clear recorded calls
    pub async fn clear_calls(&self) {
        self.state.calls.lock().await.clear();
    }

    /// Make the next `connect` fail with the given error
    pub async fn set_connect_error(&self, error: SensorError) {
        self.state.responses.write().await.connect_error = Some(error);
    }

    /// Set the response returned by `publish`
    pub async fn set_publish_response(&self, response: Result<()>) {
        self.state.responses.write().await.publish_response = Some(response);
    }

    /// Set the response returned by `disconnect`
    pub async fn set_disconnect_response(&self, response: Result<()>) {
        self.state.responses.write().await.disconnect_response = Some(response);
    }

    /// Deliver an event to whoever holds the receiver from `connect`
    pub async fn push_event(&self, event: TransportEvent) -> Result<()> {
        let guard = self.state.event_tx.lock().await;
        let tx = guard
            .as_ref()
            .ok_or_else(|| SensorError::Transport("not connected".to_string()))?;
        tx.send(event)
            .await
            .map_err(|_| SensorError::Transport("event stream closed".to_string()))
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerTransport for MockTransport {
    fn connect(&self) -> BoxFuture<'_, Result<mpsc::Receiver<TransportEvent>>> {
        Box::pin(async move {
            self.state.calls.lock().await.push(MockCall::Connect);

            if let Some(error) = self.state.responses.write().await.connect_error.take() {
                return Err(error);
            }

            let (tx, rx) = mpsc::channel(32);
            *self.state.event_tx.lock().await = Some(tx);
            self.state.connected.store(true, Ordering::SeqCst);
            Ok(rx)
        })
    }

    fn publish<'a>(
        &'a self,
        topic: impl Into<String> + Send + 'a,
        payload: impl Into<Vec<u8>> + Send + 'a,
    ) -> BoxFuture<'a, Result<()>> {
        let topic = topic.into();
        let payload = payload.into();
        Box::pin(async move {
            self.state.calls.lock().await.push(MockCall::Publish { topic, payload });

            match self.state.responses.write().await.publish_response.take() {
                Some(response) => response,
                None => Ok(()),
            }
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.state.calls.lock().await.push(MockCall::Disconnect);

            // A consumer still reading sees the teardown as a final event;
            // dropping the sender then ends the stream.
            if let Some(tx) = self.state.event_tx.lock().await.take() {
                let _ = tx.try_send(TransportEvent::Disconnected {
                    reason: DisconnectReason::ClientInitiated,
                });
            }
            self.state.connected.store(false, Ordering::SeqCst);

            match self.state.responses.write().await.disconnect_response.take() {
                Some(response) => response,
                None => Ok(()),
            }
        })
    }
}
