//! MQTT broker transport
//!
//! Wraps a rumqttc client: `connect` spawns the event-loop poll task and
//! forwards connection events over a channel; `publish` hands payloads to
//! the shared client at QoS 0. The poll task keeps running across broker
//! reconnects until `disconnect` cancels it.

use crate::config::BrokerEndpoint;
use crate::constants::defaults;
use crate::error::{Result, SensorError};
use crate::transport::{BoxFuture, BrokerTransport, DisconnectReason, TransportEvent};
use rumqttc::{AsyncClient, ConnectionError, Event, Incoming, MqttOptions, QoS, Transport};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Broker transport backed by rumqttc
#[derive(Clone)]
pub struct MqttTransport {
    endpoint: BrokerEndpoint,
    client_id: String,
    client: Arc<RwLock<Option<AsyncClient>>>,
    poll_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    cancel: CancellationToken,
}

impl MqttTransport {
    #[must_use]
    pub fn new(endpoint: BrokerEndpoint, client_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            client_id: client_id.into(),
            client: Arc::new(RwLock::new(None)),
            poll_task: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
        }
    }
}

impl BrokerTransport for MqttTransport {
    fn connect(&self) -> BoxFuture<'_, Result<mpsc::Receiver<TransportEvent>>> {
        Box::pin(async move {
            let mut options =
                MqttOptions::new(&self.client_id, &self.endpoint.host, self.endpoint.port);
            options.set_keep_alive(defaults::KEEP_ALIVE);
            if self.endpoint.tls {
                options.set_transport(Transport::tls_with_default_config());
            }

            let (client, mut event_loop) =
                AsyncClient::new(options, defaults::EVENT_CHANNEL_CAPACITY);
            let (events_tx, events_rx) = mpsc::channel(defaults::EVENT_CHANNEL_CAPACITY);
            let cancel = self.cancel.clone();

            let handle = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        event = event_loop.poll() => match event {
                            Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                                let forwarded = events_tx
                                    .send(TransportEvent::Connected {
                                        session_present: ack.session_present,
                                    })
                                    .await;
                                if forwarded.is_err() {
                                    break;
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                let event = match e {
                                    ConnectionError::Io(io_err) => TransportEvent::Disconnected {
                                        reason: DisconnectReason::NetworkError(io_err.to_string()),
                                    },
                                    other => TransportEvent::Error {
                                        message: other.to_string(),
                                    },
                                };
                                if events_tx.send(event).await.is_err() {
                                    break;
                                }
                                // The event loop reconnects on the next poll;
                                // pace it so a dead broker does not spin.
                                tokio::time::sleep(defaults::POLL_RETRY_DELAY).await;
                            }
                        }
                    }
                }
            });

            *self.client.write().await = Some(client);
            *self.poll_task.lock().await = Some(handle);
            Ok(events_rx)
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
            let client = self
                .client
                .read()
                .await
                .clone()
                .ok_or_else(|| SensorError::Transport("not connected".to_string()))?;

            client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .await
                .map_err(|e| SensorError::Transport(e.to_string()))
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if let Some(client) = self.client.read().await.clone() {
                if let Err(e) = client.disconnect().await {
                    // The session may already be gone; teardown continues.
                    tracing::debug!(error = %e, "MQTT disconnect on closed session");
                }
            }

            self.cancel.cancel();
            if let Some(handle) = self.poll_task.lock().await.take() {
                let _ = handle.await;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_before_connect_errors() {
        let endpoint = BrokerEndpoint::parse("mqtt://localhost").unwrap();
        let transport = MqttTransport::new(endpoint, "virtual-sensor-test");

        let err = transport.publish("data/ingest", vec![1, 2, 3]).await;
        assert!(matches!(err, Err(SensorError::Transport(_))));
    }

    #[tokio::test]
    async fn test_disconnect_before_connect_is_harmless() {
        let endpoint = BrokerEndpoint::parse("mqtt://localhost").unwrap();
        let transport = MqttTransport::new(endpoint, "virtual-sensor-test");

        transport.disconnect().await.unwrap();
    }
}
