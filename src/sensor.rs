//! Periodic producer driving the publish loop
//!
//! [`VirtualSensor`] owns the firing schedule: `start` runs the producer once
//! before returning, then a background task repeats it on the configured
//! interval until `stop`. Firings are serialized; the schedule task awaits
//! each invocation, so a slow producer delays the next tick instead of
//! overlapping it.

use crate::error::{Result, SensorError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Interval-driven producer with an explicit start/stop lifecycle
///
/// The state machine is Idle -> Active on `start` and Active -> Idle on
/// `stop`; `start` on an active sensor errors and `stop` on an idle one is a
/// no-op.
pub struct VirtualSensor<F> {
    interval: Duration,
    producer: Arc<Mutex<F>>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
    active: bool,
}

impl<F, Fut> VirtualSensor<F>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    /// Creates an idle sensor; nothing is scheduled until [`start`](Self::start)
    #[must_use]
    pub fn new(interval: Duration, producer: F) -> Self {
        Self {
            interval,
            producer: Arc::new(Mutex::new(producer)),
            cancel: None,
            handle: None,
            active: false,
        }
    }

    /// Starts the firing schedule
    ///
    /// The first firing completes before this returns; subsequent firings
    /// run on the interval in a background task.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::AlreadyActive`] when the sensor is already
    /// running.
    pub async fn start(&mut self) -> Result<()> {
        if self.active {
            return Err(SensorError::AlreadyActive);
        }

        tracing::info!("Virtual sensor starting up!");
        Self::fire(&self.producer).await;

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let producer = Arc::clone(&self.producer);
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // The first tick completes immediately; the inline firing above
            // already covered it.
            ticker.tick().await;

            loop {
                // Cancellation wins a tie with an overdue tick; no firing
                // begins after stop has been requested.
                tokio::select! {
                    biased;

                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => Self::fire(&producer).await,
                }
            }
        });

        self.cancel = Some(cancel);
        self.handle = Some(handle);
        self.active = true;
        Ok(())
    }

    /// Stops the firing schedule
    ///
    /// An in-flight firing completes; cancellation only governs future
    /// firings. Calling this on an idle sensor is a no-op apart from the
    /// lifecycle log line, which is emitted on every call.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` keeps the lifecycle API uniform.
    pub async fn stop(&mut self) -> Result<()> {
        if self.active {
            if let Some(cancel) = self.cancel.take() {
                cancel.cancel();
            }
            if let Some(handle) = self.handle.take() {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Sensor schedule task failed");
                }
            }
            self.active = false;
        }

        tracing::info!("Virtual sensor stopped!");
        Ok(())
    }

    /// Whether the firing schedule is currently running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The configured firing interval
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn fire(producer: &Arc<Mutex<F>>) {
        let mut producer = producer.lock().await;
        let firing = (*producer)();
        drop(producer);
        firing.await;
    }
}
