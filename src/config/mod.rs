// src/config/mod.rs

//! Configuration loading and validation for livesync.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse human-friendly durations (`duration.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate URLs and timings, deriving the stream URL (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_config, load_from_path};
pub use model::{ConfigFile, LiveSection, RawConfigFile, ServerSection};
