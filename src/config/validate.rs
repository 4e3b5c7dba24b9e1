// src/config/validate.rs

use url::Url;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, LiveSection, RawConfigFile, RawLiveSection, RawServerSection, ServerSection,
};
use crate::errors::{Result, SyncError};

/// Path the event stream lives under, relative to the API host.
const STREAM_PATH: &str = "/ws/live/";

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SyncError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let server = validate_server(&raw.server)?;
        let live = validate_live(&raw.live)?;
        Ok(ConfigFile::new_unchecked(server, live))
    }
}

fn validate_server(raw: &RawServerSection) -> Result<ServerSection> {
    let api_url = parse_base_url("[server].api_url", &raw.api_url, &["http", "https"])?;

    let stream_url = match raw.stream_url.as_deref() {
        Some(stream_url) => parse_base_url("[server].stream_url", stream_url, &["ws", "wss"])?,
        None => derive_stream_url(&api_url)?,
    };

    let request_timeout = field_duration("[server].request_timeout", &raw.request_timeout)?;

    Ok(ServerSection {
        api_url,
        stream_url,
        request_timeout,
    })
}

fn validate_live(raw: &RawLiveSection) -> Result<LiveSection> {
    Ok(LiveSection {
        reconnect_delay: field_duration("[live].reconnect_delay", &raw.reconnect_delay)?,
        heartbeat_interval: field_duration("[live].heartbeat_interval", &raw.heartbeat_interval)?,
        tick_interval: field_duration("[live].tick_interval", &raw.tick_interval)?,
        refresh_snapshot_on_reconnect: raw.refresh_snapshot_on_reconnect,
    })
}

fn field_duration(field: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value).map_err(|e| SyncError::ConfigError(format!("{field}: {e}")))
}

/// Parse a URL that relative paths get joined onto; adds the trailing `/`
/// `Url::join` needs to keep the last segment.
fn parse_base_url(field: &str, value: &str, schemes: &[&str]) -> Result<Url> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| SyncError::ConfigError(format!("{field}: invalid URL '{value}': {e}")))?;

    if !schemes.contains(&url.scheme()) {
        return Err(SyncError::ConfigError(format!(
            "{field}: unsupported scheme '{}' (expected {})",
            url.scheme(),
            schemes.join(" or ")
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// `http://host:port/anything` -> `ws://host:port/ws/live/`.
pub fn derive_stream_url(api_url: &Url) -> Result<Url> {
    let scheme = match api_url.scheme() {
        "https" => "wss",
        _ => "ws",
    };

    let mut url = api_url.clone();
    url.set_scheme(scheme).map_err(|()| {
        SyncError::ConfigError(format!("cannot derive a stream URL from '{api_url}'"))
    })?;
    url.set_path(STREAM_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
