//! # mxchart-server
//!
//! HTTP front end for mxchart: a single gated `POST /render` endpoint that
//! validates a task list, assembles the timeline document and returns it as a
//! PNG, plus an ungated `GET /health` check.
//!
//! ```rust,ignore
//! use mxchart_server::{serve, ServerConfig, SharedSecret};
//!
//! let config = ServerConfig::new("0.0.0.0:3000".parse()?, SharedSecret::new(secret));
//! serve(config).await?;
//! ```

pub mod config;
pub mod gate;
pub mod http;

pub use config::{ConfigError, ServerConfig, SharedSecret};
pub use gate::{AccessDecision, AccessGate, DenyReason, Principal};
pub use http::{router, serve, ApiError, AppState, Clock};
