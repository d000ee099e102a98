//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup (from CLI arguments, optionally layered
//! over a TOML config file) and then shared read-only across the pipeline.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the domain) keeps the bridge easy to embed in
//! tests; the infrastructure layer is responsible for populating it.

use std::net::SocketAddr;

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use stagecast_bridge::domain::BridgeConfig;
///
/// // Defaults are suitable for local development:
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 8080);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The address and port the subscriber WebSocket server binds to.
    ///
    /// `0.0.0.0` accepts connections from any network interface; set to
    /// `127.0.0.1` to accept only local subscribers.
    pub ws_bind_addr: SocketAddr,

    /// Capacity of the in-process event queue between the publisher and
    /// the dispatch task.
    ///
    /// When the queue is full, publishes fail as transport errors and the
    /// event is dropped: freshest state wins, a backlog of stale frames
    /// would be worse than the gap.
    pub event_capacity: usize,

    /// Maximum number of concurrently connected subscribers; registrations
    /// beyond this are refused.
    pub max_subscribers: usize,

    /// Sample rate of the synthetic body source, in Hz.
    pub body_rate_hz: u32,

    /// When set, every Nth synthetic capture cycle reports an acquisition
    /// miss.  Useful for exercising the dropped-frame path end to end.
    pub body_drop_every: Option<u32>,

    /// Whether to open the MIDI controller source at startup.
    pub midi_enabled: bool,

    /// Index of the MIDI input port to open.
    pub midi_port: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ws_bind_addr: "0.0.0.0:8080".parse().expect("static address is valid"),
            event_capacity: 256,
            max_subscribers: 64,
            body_rate_hz: 30,
            body_drop_every: None,
            midi_enabled: true,
            midi_port: 0,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binds_all_interfaces_on_8080() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.ws_bind_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_default_enables_midi_on_first_port() {
        let cfg = BridgeConfig::default();
        assert!(cfg.midi_enabled);
        assert_eq!(cfg.midi_port, 0);
    }

    #[test]
    fn test_default_has_no_synthetic_drops() {
        assert_eq!(BridgeConfig::default().body_drop_every, None);
    }
}
