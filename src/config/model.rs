// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::engine::EngineOptions;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [server]
/// api_url = "http://127.0.0.1:8000/api/"
/// stream_url = "ws://127.0.0.1:8000/ws/live/"
/// request_timeout = "10s"
///
/// [live]
/// reconnect_delay = "3s"
/// heartbeat_interval = "30s"
/// tick_interval = "1s"
/// refresh_snapshot_on_reconnect = false
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: RawServerSection,

    #[serde(default)]
    pub live: RawLiveSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawServerSection {
    /// Base of the REST API; snapshot and control paths are joined onto it.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Prefix of the event stream URL. Derived from `api_url` when absent.
    #[serde(default)]
    pub stream_url: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000/api/".to_string()
}

fn default_request_timeout() -> String {
    "10s".to_string()
}

impl Default for RawServerSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            stream_url: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// `[live]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLiveSection {
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: String,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: String,

    #[serde(default = "default_tick_interval")]
    pub tick_interval: String,

    /// Re-fetch the snapshot before re-subscribing after a dropped stream.
    #[serde(default)]
    pub refresh_snapshot_on_reconnect: bool,
}

fn default_reconnect_delay() -> String {
    "3s".to_string()
}

fn default_heartbeat_interval() -> String {
    "30s".to_string()
}

fn default_tick_interval() -> String {
    "1s".to_string()
}

impl Default for RawLiveSection {
    fn default() -> Self {
        Self {
            reconnect_delay: default_reconnect_delay(),
            heartbeat_interval: default_heartbeat_interval(),
            tick_interval: default_tick_interval(),
            refresh_snapshot_on_reconnect: false,
        }
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub live: LiveSection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSection {
    /// Always ends with `/`.
    pub api_url: Url,
    /// Always ends with `/`; the execution id is appended to it.
    pub stream_url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveSection {
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
    pub tick_interval: Duration,
    pub refresh_snapshot_on_reconnect: bool,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(server: ServerSection, live: LiveSection) -> Self {
        Self { server, live }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            reconnect_delay: self.live.reconnect_delay,
            heartbeat_interval: self.live.heartbeat_interval,
            tick_interval: self.live.tick_interval,
            refresh_snapshot_on_reconnect: self.live.refresh_snapshot_on_reconnect,
        }
    }
}
