//! TOML config file support.
//!
//! The bridge runs fine on CLI defaults; a config file is for deployments
//! that want the settings versioned next to the unit file.  Example:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:9000"
//! max_subscribers = 16
//!
//! [body]
//! rate_hz = 60
//!
//! [midi]
//! enabled = false
//! ```
//!
//! Every field is optional: absent fields keep whatever value the config
//! already carries (defaults, or prior CLI layering).  CLI flags override
//! file values, so the precedence is defaults < file < flags.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::BridgeConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field parsed as TOML but not as its target type.
    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

// ── File schema ───────────────────────────────────────────────────────────────

/// On-disk configuration schema.  All fields optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub body: BodySection,
    #[serde(default)]
    pub midi: MidiSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Bind address, e.g. `"0.0.0.0:8080"`.
    pub bind: Option<String>,
    pub event_capacity: Option<usize>,
    pub max_subscribers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct BodySection {
    pub rate_hz: Option<u32>,
    pub drop_every: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MidiSection {
    pub enabled: Option<bool>,
    pub port: Option<usize>,
}

// ── Operations ────────────────────────────────────────────────────────────────

/// Reads and parses the config file at `path`.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: FileConfig = toml::from_str(&text)?;
    info!(path = %path.display(), "loaded config file");
    Ok(file)
}

impl FileConfig {
    /// Layers this file's values over `config`, leaving absent fields alone.
    pub fn apply(&self, config: &mut BridgeConfig) -> Result<(), ConfigError> {
        if let Some(bind) = &self.server.bind {
            config.ws_bind_addr =
                bind.parse::<SocketAddr>()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "server.bind",
                        value: bind.clone(),
                    })?;
        }
        if let Some(capacity) = self.server.event_capacity {
            config.event_capacity = capacity;
        }
        if let Some(max) = self.server.max_subscribers {
            config.max_subscribers = max;
        }
        if let Some(rate) = self.body.rate_hz {
            config.body_rate_hz = rate;
        }
        if let Some(drop) = self.body.drop_every {
            config.body_drop_every = Some(drop);
        }
        if let Some(enabled) = self.midi.enabled {
            config.midi_enabled = enabled;
        }
        if let Some(port) = self.midi.port {
            config.midi_port = port;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
