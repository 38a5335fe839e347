//! Publish workflow orchestration
//!
//! Wires the broker transport, the identity provider, and the periodic
//! sensor together: connect, authenticate on the first acknowledgement,
//! then emit a telemetry blob every interval until shutdown. A failed
//! login closes the connection and ends the run; transport errors after
//! a successful login are logged and the sensor keeps firing.

use crate::auth::{AuthSession, CognitoProvider, Credentials, IdentityProvider};
use crate::config::{Config, ScriptMode};
use crate::constants::{defaults, wire};
use crate::error::Result;
use crate::sample::{Envelope, Reading};
use crate::sensor::VirtualSensor;
use crate::transport::{BrokerTransport, MqttTransport, TransportEvent};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Drives the connect, login, publish lifecycle
pub struct PublishOrchestrator<T, P> {
    config: Config,
    transport: T,
    session: AuthSession<P>,
    shutdown: CancellationToken,
}

impl PublishOrchestrator<MqttTransport, CognitoProvider> {
    /// Builds the production wiring from a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client for the identity provider
    /// cannot be constructed.
    pub fn new(config: Config) -> Result<Self> {
        // The Cognito app client id is credential material; the broker
        // session gets its own generated identifier.
        let session_id = format!("virtual-sensor-{:08x}", rand::thread_rng().gen::<u32>());
        let transport = MqttTransport::new(config.broker.clone(), session_id);
        let provider = CognitoProvider::new(&config.user_pool, config.client_id.clone())?;
        Ok(Self::with_parts(config, transport, provider))
    }
}

impl<T, P> PublishOrchestrator<T, P>
where
    T: BrokerTransport + Clone + Send + Sync + 'static,
    P: IdentityProvider,
{
    /// Assembles an orchestrator from explicit parts
    #[must_use]
    pub fn with_parts(config: Config, transport: T, provider: P) -> Self {
        Self {
            config,
            transport,
            session: AuthSession::new(provider),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops [`run`](Self::run) when cancelled
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the workflow to completion
    ///
    /// Connects to the broker, logs in on the first connection
    /// acknowledgement, and starts the periodic sensor with the issued
    /// token. Returns once the shutdown token fires, the event stream
    /// closes, or the login is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error when the initial broker connection cannot be
    /// established or teardown of the sensor task fails. A rejected
    /// login is handled internally and ends the run with `Ok`.
    pub async fn run(self) -> Result<()> {
        let mut events = self.transport.connect().await?;

        let token_slot: Arc<RwLock<Option<String>>> = Arc::new(RwLock::new(None));
        let blob_counter = Arc::new(AtomicU64::new(0));

        let producer = {
            let transport = self.transport.clone();
            let token_slot = Arc::clone(&token_slot);
            let blob_counter = Arc::clone(&blob_counter);
            let mode = self.config.mode;
            move || {
                let transport = transport.clone();
                let token_slot = Arc::clone(&token_slot);
                let blob_counter = Arc::clone(&blob_counter);
                async move {
                    // Counted up front so every firing gets a fresh number,
                    // delivered or not.
                    let blob = blob_counter.fetch_add(1, Ordering::SeqCst);
                    let reading = Reading::generate();
                    let token = token_slot.read().await.clone();
                    let envelope = Envelope::new(token, reading);

                    let payload = match serde_json::to_string(&envelope) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize telemetry blob");
                            return;
                        }
                    };

                    match mode {
                        ScriptMode::Send => {
                            tracing::info!(
                                "[BLOB {blob}] Sending {} bytes to the broker",
                                payload.len()
                            );
                            if let Err(e) =
                                transport.publish(wire::INGEST_TOPIC, payload.into_bytes()).await
                            {
                                tracing::error!(error = %e, "Failed to publish telemetry blob");
                            }
                        }
                        ScriptMode::Test => {
                            tracing::debug!("[BLOB {blob}] {payload}");
                        }
                    }
                }
            }
        };

        let mut sensor = VirtualSensor::new(defaults::PUBLISH_INTERVAL, producer);
        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());
        let mut authenticated = false;
        let mut closed = false;

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    match event {
                        TransportEvent::Connected { .. } if !authenticated => {
                            tracing::info!("Connected to MQTT broker.");
                            authenticated = true;
                            match self.session.authenticate(&credentials).await {
                                Ok(token) => {
                                    tracing::info!("Issued Cognito token.");
                                    *token_slot.write().await = Some(token.into_inner());
                                    sensor.start().await?;
                                }
                                Err(e) => {
                                    tracing::error!(error = %e, "Failed to acquire Cognito token!");
                                    self.transport.disconnect().await?;
                                    closed = true;
                                    break;
                                }
                            }
                        }
                        TransportEvent::Connected { session_present } => {
                            tracing::debug!(session_present, "Broker session re-established.");
                        }
                        TransportEvent::Disconnected { reason } => {
                            tracing::warn!(?reason, "Lost connection to MQTT broker");
                        }
                        TransportEvent::Error { message } => {
                            tracing::error!(error = %message, "MQTT transport error");
                        }
                    }
                }
            }
        }

        if sensor.is_active() {
            sensor.stop().await?;
        }
        if !closed {
            self.transport.disconnect().await?;
        }
        Ok(())
    }
}
