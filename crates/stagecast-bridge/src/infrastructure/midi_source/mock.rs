//! Mock controller source for unit and integration testing.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use stagecast_core::ChannelMessage;

use super::{CaptureError, ControllerSource};

/// A mock implementation of [`ControllerSource`] driven by the test.
pub struct MockControllerSource {
    sender: Arc<Mutex<Option<Sender<ChannelMessage>>>>,
}

impl MockControllerSource {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects a message as if the device had produced it.
    ///
    /// Panics if `start()` has not been called or `stop()` already has.
    pub fn inject_message(&self, msg: ChannelMessage) {
        let guard = self.sender.lock().expect("lock poisoned");
        match &*guard {
            Some(sender) => sender
                .send(msg)
                .expect("receiver dropped; is the capture loop running?"),
            None => panic!("MockControllerSource::inject_message called before start()"),
        }
    }
}

impl Default for MockControllerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerSource for MockControllerSource {
    fn start(&self) -> Result<mpsc::Receiver<ChannelMessage>, CaptureError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(key: &str, value: &str) -> ChannelMessage {
        ChannelMessage {
            command: "Controller".to_string(),
            channel: "1".to_string(),
            data1: key.to_string(),
            data2: value.to_string(),
        }
    }

    #[test]
    fn test_mock_controller_source_delivers_injected_messages() {
        let source = MockControllerSource::new();
        let rx = source.start().expect("start");

        source.inject_message(controller("10", "5"));

        let msg = rx.recv().expect("message delivered");
        assert_eq!(msg.data1, "10");
        assert_eq!(msg.data2, "5");
    }

    #[test]
    fn test_mock_controller_source_stop_closes_the_channel() {
        let source = MockControllerSource::new();
        let rx = source.start().expect("start");

        source.stop();

        assert!(rx.recv().is_err());
    }
}
