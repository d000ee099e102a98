//! Latched controller state: last observed value per controller key.
//!
//! The cache exists so a subscriber that joins (or resynchronizes)
//! mid-session can recover the controller surface's full state: pressing
//! the sync button on the hardware (key 46 at full value) replays every
//! cached entry in the order the keys were first seen.
//!
//! Entries persist for the lifetime of the process.  The key space is
//! small and fixed by the hardware, so unbounded growth is a non-issue.

use tracing::debug;

/// Channel-message command that carries a continuous-control change.
pub const CONTROLLER_COMMAND: &str = "Controller";

/// Controller key that requests a full state replay.
pub const SYNC_REQUEST_KEY: &str = "46";

/// Value of [`SYNC_REQUEST_KEY`] that triggers the replay.
pub const SYNC_REQUEST_VALUE: &str = "127";

/// A raw channel message as the controller device layer reports it.
///
/// All fields are the device layer's string renderings; the core never
/// interprets values beyond the sync sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Message category (e.g. "Controller", "NoteOn").
    pub command: String,
    /// MIDI channel the message arrived on.
    pub channel: String,
    /// First data byte: the controller key for "Controller" messages.
    pub data1: String,
    /// Second data byte: the controller value for "Controller" messages.
    pub data2: String,
}

/// One outgoing (channel, key, value) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerUpdate {
    pub channel: String,
    pub key: String,
    pub value: String,
}

/// Insertion-ordered map of controller key → last observed value.
///
/// Owned exclusively by the controller's callback context; no lock needed.
#[derive(Debug, Default)]
pub struct ControllerStateCache {
    /// (key, latest value), ordered by first observation of each key.
    entries: Vec<(String, String)>,
}

impl ControllerStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of distinct keys observed so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Processes one raw channel message.
    ///
    /// Only `command == "Controller"` events touch the cache or emit
    /// updates; every other category is out of scope for broadcast and
    /// returns an empty list.
    pub fn handle(&mut self, msg: &ChannelMessage) -> Vec<ControllerUpdate> {
        if msg.command != CONTROLLER_COMMAND {
            return Vec::new();
        }
        self.observe(&msg.channel, &msg.data1, &msg.data2)
    }

    /// Latches `state[key] = value` and returns the updates to publish.
    ///
    /// For the sync sentinel (key 46, value 127) this is one update per
    /// cached entry, including the just-latched sentinel itself, in
    /// first-seen key order, each carrying the triggering event's channel.
    /// For everything else it is exactly the single observed triple.
    pub fn observe(&mut self, channel: &str, key: &str, value: &str) -> Vec<ControllerUpdate> {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, latched)) => *latched = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }

        if key == SYNC_REQUEST_KEY && value == SYNC_REQUEST_VALUE {
            debug!(entries = self.entries.len(), "sync request; replaying controller state");
            self.entries
                .iter()
                .map(|(k, v)| ControllerUpdate {
                    channel: channel.to_string(),
                    key: k.clone(),
                    value: v.clone(),
                })
                .collect()
        } else {
            vec![ControllerUpdate {
                channel: channel.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            }]
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
