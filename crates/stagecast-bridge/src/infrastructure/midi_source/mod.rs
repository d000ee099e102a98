//! MIDI controller boundary.
//!
//! The controller device lives behind the [`ControllerSource`] trait: a
//! source is started once, delivers raw [`ChannelMessage`]s on a plain
//! channel consumed by the controller capture loop, and is stopped at
//! shutdown.
//!
//! The device layer does no filtering beyond byte-level decoding: every
//! channel message it can name is forwarded with its command string, and
//! the controller state cache decides what is in scope for broadcast.
//!
//! # Implementations
//!
//! - [`device::MidirControllerSource`]: real devices via `midir`.
//! - [`mock::MockControllerSource`]: test double with message injection.

use std::sync::mpsc;

use stagecast_core::ChannelMessage;

use super::CaptureError;

pub mod device;
pub mod mock;

/// Trait abstracting controller message production.
pub trait ControllerSource: Send {
    /// Starts the source and returns the receiver for its messages.
    fn start(&self) -> Result<mpsc::Receiver<ChannelMessage>, CaptureError>;
    /// Stops the source and releases the device.
    fn stop(&self);
}
