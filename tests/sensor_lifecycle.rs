//! Timing tests for the periodic sensor, run against a paused clock

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::advance;
use tracing_subscriber::fmt::MakeWriter;
use virtual_sensor::VirtualSensor;

/// Collects formatted log output for assertions
#[derive(Clone, Default)]
struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Let spawned tasks observe wakeups without moving the clock
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_fires_once_per_interval() {
    let fired = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fired);
    let mut sensor = VirtualSensor::new(Duration::from_secs(5), move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    sensor.start().await.unwrap();
    settle().await;
    // One synchronous firing at start, none from the clock yet
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(fired.load(Ordering::SeqCst), 3);

    sensor.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_no_firings_after_stop() {
    let fired = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fired);
    let mut sensor = VirtualSensor::new(Duration::from_secs(5), move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    sensor.start().await.unwrap();
    settle().await;
    sensor.stop().await.unwrap();
    assert!(!sensor.is_active());

    advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stop_logs_lifecycle_line_even_when_idle() {
    let writer = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut sensor = VirtualSensor::new(Duration::from_secs(5), || async {});
    sensor.stop().await.unwrap();

    // Never started, yet stop announces itself like every other call.
    let output = writer.contents();
    assert!(output.contains("Virtual sensor stopped!"));
    assert!(!output.contains("Virtual sensor starting up!"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_firing_delays_next_tick() {
    let began = Arc::new(AtomicU32::new(0));
    let in_flight = Arc::new(AtomicU32::new(0));
    let max_in_flight = Arc::new(AtomicU32::new(0));

    let producer = {
        let began = Arc::clone(&began);
        let in_flight = Arc::clone(&in_flight);
        let max_in_flight = Arc::clone(&max_in_flight);
        move || {
            let n = began.fetch_add(1, Ordering::SeqCst);
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(current, Ordering::SeqCst);
            let in_flight = Arc::clone(&in_flight);
            async move {
                // Every firing after the first takes longer than the interval.
                if n >= 1 {
                    tokio::time::sleep(Duration::from_secs(8)).await;
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        }
    };
    let mut sensor = VirtualSensor::new(Duration::from_secs(5), producer);

    sensor.start().await.unwrap();
    settle().await;
    assert_eq!(began.load(Ordering::SeqCst), 1);

    // Second firing begins on schedule and runs until t=13s.
    advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(began.load(Ordering::SeqCst), 2);

    // The t=10s tick elapses while the second firing is still running;
    // no third firing may begin.
    advance(Duration::from_secs(7)).await;
    settle().await;
    assert_eq!(began.load(Ordering::SeqCst), 2);

    // Once the second firing finishes, the pending tick fires.
    advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(began.load(Ordering::SeqCst), 3);

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);

    sensor.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_waits_for_in_flight_firing() {
    let began = Arc::new(AtomicU32::new(0));
    let completed = Arc::new(AtomicU32::new(0));

    let producer = {
        let began = Arc::clone(&began);
        let completed = Arc::clone(&completed);
        move || {
            let n = began.fetch_add(1, Ordering::SeqCst);
            let completed = Arc::clone(&completed);
            async move {
                if n >= 1 {
                    tokio::time::sleep(Duration::from_secs(8)).await;
                }
                completed.fetch_add(1, Ordering::SeqCst);
            }
        }
    };
    let mut sensor = VirtualSensor::new(Duration::from_secs(5), producer);

    sensor.start().await.unwrap();
    settle().await;

    // Begin the slow second firing, then stop mid-flight.
    advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(began.load(Ordering::SeqCst), 2);
    assert_eq!(completed.load(Ordering::SeqCst), 1);

    sensor.stop().await.unwrap();
    assert_eq!(completed.load(Ordering::SeqCst), 2);

    advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(began.load(Ordering::SeqCst), 2);
}
