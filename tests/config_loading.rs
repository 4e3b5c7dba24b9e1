// tests/config_loading.rs

use std::fs;
use std::time::Duration;

use tempfile::tempdir;

use livesync::config::{load_and_validate, load_config, parse_duration, ConfigFile, RawConfigFile};
use livesync::errors::SyncError;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn defaults_apply_without_a_file() -> TestResult {
    let cfg = ConfigFile::try_from(RawConfigFile::default())?;

    assert_eq!(cfg.server.api_url.as_str(), "http://127.0.0.1:8000/api/");
    assert_eq!(cfg.server.stream_url.as_str(), "ws://127.0.0.1:8000/ws/live/");
    assert_eq!(cfg.server.request_timeout, Duration::from_secs(10));

    let options = cfg.engine_options();
    assert_eq!(options.reconnect_delay, Duration::from_secs(3));
    assert_eq!(options.heartbeat_interval, Duration::from_secs(30));
    assert_eq!(options.tick_interval, Duration::from_secs(1));
    assert!(!options.refresh_snapshot_on_reconnect);
    Ok(())
}

#[test]
fn full_file_is_loaded_and_validated() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Livesync.toml");
    fs::write(
        &path,
        r#"
[server]
api_url = "https://dash.example.com/api"
request_timeout = "2500ms"

[live]
reconnect_delay = "5s"
heartbeat_interval = "1m"
tick_interval = "1s"
refresh_snapshot_on_reconnect = true
"#,
    )?;

    let cfg = load_and_validate(&path)?;

    // Trailing slash added so endpoint joins stay under /api/.
    assert_eq!(cfg.server.api_url.as_str(), "https://dash.example.com/api/");
    assert_eq!(cfg.server.stream_url.as_str(), "wss://dash.example.com/ws/live/");
    assert_eq!(cfg.server.request_timeout, Duration::from_millis(2500));
    assert_eq!(cfg.live.reconnect_delay, Duration::from_secs(5));
    assert_eq!(cfg.live.heartbeat_interval, Duration::from_secs(60));
    assert!(cfg.live.refresh_snapshot_on_reconnect);
    Ok(())
}

#[test]
fn explicit_stream_url_is_kept() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("custom.toml");
    fs::write(
        &path,
        r#"
[server]
api_url = "http://10.0.0.5:9000/"
stream_url = "ws://10.0.0.6:9001/live"
"#,
    )?;

    let cfg = load_config(Some(&path), None)?;
    assert_eq!(cfg.server.stream_url.as_str(), "ws://10.0.0.6:9001/live/");
    Ok(())
}

#[test]
fn api_url_override_also_moves_the_derived_stream_url() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Livesync.toml");
    fs::write(&path, "[server]\napi_url = \"http://a.example/api/\"\n")?;

    let cfg = load_config(Some(&path), Some("http://b.example:8080/api/"))?;
    assert_eq!(cfg.server.api_url.as_str(), "http://b.example:8080/api/");
    assert_eq!(cfg.server.stream_url.as_str(), "ws://b.example:8080/ws/live/");
    Ok(())
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    let err = load_config(Some(&path), None).unwrap_err();
    assert!(matches!(err, SyncError::ConfigError(ref msg) if msg.contains("nope.toml")));
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        "[server]\napi_url = \"ftp://example.com/\"\n",
        "[server]\napi_url = \"not a url\"\n",
        "[server]\nstream_url = \"http://example.com/ws/\"\n",
        "[live]\nreconnect_delay = \"0s\"\n",
        "[live]\nheartbeat_interval = \"30\"\n",
        "[live]\ntick_interval = \"1d\"\n",
    ];

    for contents in cases {
        let raw: RawConfigFile = toml::from_str(contents).unwrap();
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(
            matches!(err, SyncError::ConfigError(_)),
            "expected config error for {contents:?}, got {err:?}"
        );
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[server\napi_url = 1").unwrap();

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, SyncError::TomlError(_)));
}

#[test]
fn durations_accept_the_usual_suffixes() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1H"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("0ms").is_err());
}
