// src/api/mod.rs

//! Request/response side of the backend: snapshot fetch and control commands.
//!
//! - [`client`] provides the `LiveApi` trait the engine depends on.
//! - [`http`] provides `HttpLiveApi`, the reqwest implementation used in
//!   production.
//! - [`model`] holds the response bodies.

pub mod client;
pub mod http;
pub mod model;

pub use client::{ApiFuture, LiveApi};
pub use http::HttpLiveApi;
pub use model::{ControlFlags, ExecutionInfo, Snapshot};
