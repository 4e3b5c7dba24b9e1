// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::{ControlAction, ControlStatus, ExecutionId};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Execution not found: {0}")]
    NotFound(ExecutionId),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend rejected request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed event payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Cannot {action} an execution that is {status}")]
    ControlNotApplicable {
        action: ControlAction,
        status: ControlStatus,
    },

    #[error("Request was superseded before it completed")]
    Cancelled,

    #[error("Live session is closed")]
    SessionClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SyncError>;
