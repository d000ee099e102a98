//! Mock body source for unit and integration testing.
//!
//! Allows tests to inject synthetic [`SensorEvent`]s, including dropped
//! frames and availability flaps, without any hardware or timing
//! dependency.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use super::{BodySource, CaptureError, SensorEvent};

/// A mock implementation of [`BodySource`] driven entirely by the test.
pub struct MockBodySource {
    sender: Arc<Mutex<Option<Sender<SensorEvent>>>>,
}

impl MockBodySource {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects an event as if the sensor had produced it.
    ///
    /// Panics if `start()` has not been called or `stop()` already has.
    pub fn inject_event(&self, event: SensorEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match &*guard {
            Some(sender) => sender
                .send(event)
                .expect("receiver dropped; is the capture loop running?"),
            None => panic!("MockBodySource::inject_event called before start()"),
        }
    }
}

impl Default for MockBodySource {
    fn default() -> Self {
        Self::new()
    }
}

impl BodySource for MockBodySource {
    fn start(&self) -> Result<mpsc::Receiver<SensorEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel and ends the capture loop.
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_body_source_delivers_injected_events() {
        let source = MockBodySource::new();
        let rx = source.start().expect("start");

        source.inject_event(SensorEvent::Availability(true));
        source.inject_event(SensorEvent::Sample(None));

        assert!(matches!(rx.recv().unwrap(), SensorEvent::Availability(true)));
        assert!(matches!(rx.recv().unwrap(), SensorEvent::Sample(None)));
    }

    #[test]
    fn test_mock_body_source_stop_closes_the_channel() {
        let source = MockBodySource::new();
        let rx = source.start().expect("start");

        source.stop();

        assert!(rx.recv().is_err(), "channel must close after stop()");
    }
}
