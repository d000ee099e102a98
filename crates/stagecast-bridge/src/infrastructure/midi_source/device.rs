//! Real MIDI controller source backed by `midir`.
//!
//! Opens one input port and decodes each incoming channel message into the
//! stringly [`ChannelMessage`] the rest of the pipeline consumes.  The
//! midir callback runs on the driver's own thread; it only decodes and
//! forwards, never touches pipeline state.
//!
//! A missing or unopenable device surfaces as a [`CaptureError`] from
//! `start()`; the binary logs it once and runs the session without
//! controller input.

use std::sync::{mpsc, Mutex};

use midir::{MidiInput, MidiInputConnection};
use tracing::{debug, info};

use stagecast_core::ChannelMessage;

use super::{CaptureError, ControllerSource};

/// Client name reported to the MIDI subsystem.
const CLIENT_NAME: &str = "stagecast-bridge";

/// A [`ControllerSource`] reading from a midir input port.
pub struct MidirControllerSource {
    port_index: usize,
    /// Held while listening; dropping it closes the port.
    connection: Mutex<Option<MidiInputConnection<()>>>,
}

impl MidirControllerSource {
    pub fn new(port_index: usize) -> Self {
        Self {
            port_index,
            connection: Mutex::new(None),
        }
    }
}

impl ControllerSource for MidirControllerSource {
    fn start(&self) -> Result<mpsc::Receiver<ChannelMessage>, CaptureError> {
        let input = MidiInput::new(CLIENT_NAME)
            .map_err(|e| CaptureError::DeviceOpenFailed(e.to_string()))?;

        let ports = input.ports();
        info!("number of MIDI input ports: {}", ports.len());

        let port = ports.get(self.port_index).ok_or_else(|| {
            CaptureError::NoDevice(format!("MIDI input port {} not present", self.port_index))
        })?;

        if let Ok(name) = input.port_name(port) {
            info!(port = self.port_index, "opening MIDI input '{name}'");
        }

        let (tx, rx) = mpsc::channel();
        let connection = input
            .connect(
                port,
                "stagecast-controller",
                move |_timestamp_us, bytes, _| {
                    if let Some(msg) = decode_channel_message(bytes) {
                        // A send failure just means the capture loop is gone.
                        let _ = tx.send(msg);
                    }
                },
                (),
            )
            .map_err(|e| CaptureError::DeviceOpenFailed(e.to_string()))?;

        *self.connection.lock().expect("lock poisoned") = Some(connection);
        Ok(rx)
    }

    fn stop(&self) {
        if let Some(connection) = self.connection.lock().expect("lock poisoned").take() {
            let _ = connection.close();
            debug!("MIDI input closed");
        }
    }
}

/// Decodes one raw MIDI packet into a [`ChannelMessage`].
///
/// Returns `None` for system messages (status ≥ 0xF0) and anything too
/// short to carry a channel voice message.
pub(crate) fn decode_channel_message(bytes: &[u8]) -> Option<ChannelMessage> {
    let (&status, data) = bytes.split_first()?;
    if status < 0x80 || status >= 0xF0 {
        // Running status is not reconstructed; system messages carry no channel.
        return None;
    }

    let command = match status & 0xF0 {
        0x80 => "NoteOff",
        0x90 => "NoteOn",
        0xA0 => "PolyPressure",
        0xB0 => "Controller",
        0xC0 => "ProgramChange",
        0xD0 => "ChannelPressure",
        0xE0 => "PitchBend",
        _ => return None,
    };

    Some(ChannelMessage {
        command: command.to_string(),
        channel: (status & 0x0F).to_string(),
        data1: data.first().copied().unwrap_or(0).to_string(),
        data2: data.get(1).copied().unwrap_or(0).to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
