//! Infrastructure layer: hub, WebSocket server, device sources, storage.

use thiserror::Error;

pub mod body_source;
pub mod hub;
pub mod midi_source;
pub mod storage;
pub mod ws_server;

pub use hub::{run_dispatch, Hub, HubConnector};
pub use ws_server::run_server;

/// Error type for capture source start/stop operations.
///
/// Shared by the body and controller sources: both boundaries can find no
/// device, fail to open one, or fail to stand up their capture thread.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No matching input device is present.
    #[error("no input device available: {0}")]
    NoDevice(String),
    /// The device exists but could not be opened.
    #[error("failed to open input device: {0}")]
    DeviceOpenFailed(String),
    /// The capture thread could not be spawned.
    #[error("failed to spawn capture thread")]
    SpawnFailed(#[from] std::io::Error),
}
