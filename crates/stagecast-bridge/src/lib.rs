//! stagecast-bridge library crate.
//!
//! This crate hosts the StageCast pipeline: it captures body-tracking and
//! MIDI controller events, assembles them into structured frames, and fans
//! them out to WebSocket subscribers through a self-healing publisher
//! connection.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Body sensor ──┐                         ┌── WebSocket subscriber
//! MIDI device ──┤ capture threads         ├── WebSocket subscriber
//!               ▼                         ▼
//! [stagecast-bridge]
//!   ├── domain/           BridgeConfig
//!   ├── application/      PublisherConnection, capture loops,
//!   │                     the BroadcastChannel boundary
//!   └── infrastructure/
//!         ├── hub/        Subscriber registry + dispatch task
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         ├── body_source/  Sensor boundary (synthetic + mock)
//!         ├── midi_source/  Controller boundary (midir + mock)
//!         └── storage/    Optional TOML config file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async).
//! - `application` depends on `domain` and `stagecast-core` only; all
//!   transports and devices are reached through traits.
//! - `infrastructure` depends on everything plus `tokio`, `tungstenite`,
//!   and `midir`.
//!
//! The capture loops and the publisher are deliberately transport-blind:
//! the same code runs against the real hub and against recording fakes in
//! tests.

/// Domain layer: pure configuration types.
pub mod domain;

/// Application layer: publisher connection and capture loops.
pub mod application;

/// Infrastructure layer: hub, WebSocket server, and device sources.
pub mod infrastructure;
