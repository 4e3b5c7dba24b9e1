// src/logging.rs

//! Logging setup for `livesync` using `tracing` + `tracing-subscriber`.
//!
//! Filter resolution, first match wins:
//! 1. `--log-level` CLI flag, applied to every target
//! 2. `LIVESYNC_LOG`, either a bare level ("debug", "warning") or a full
//!    `EnvFilter` directive string ("livesync=debug,reqwest=warn")
//! 3. `info`
//!
//! Logs go to STDERR; stdout carries only the rendered execution view.

use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is not given.
pub const LOG_ENV: &str = "LIVESYNC_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// Effective filter for the CLI flag and the raw `LIVESYNC_LOG` value.
///
/// An env value that is neither a level nor a valid directive falls back to
/// `info`.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return EnvFilter::default().add_directive(level_filter(lvl).into());
    }

    let Some(raw) = env_value.map(str::trim).filter(|v| !v.is_empty()) else {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    };

    if let Some(level) = parse_level_str(raw) {
        return EnvFilter::default().add_directive(level.into());
    }

    // Bare words would parse as target names; only accept real directives.
    if !raw.contains('=') {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    }
    EnvFilter::try_new(raw).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<LevelFilter> {
    match s.to_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}
