//! Session protocol engine for the pager console.
//!
//! Connects an operator console to a radio-paging transmitter
//! controller over a persistent WebSocket carrying single-key JSON
//! envelopes. The engine owns the connection lifecycle (establish,
//! detect loss, reconnect), authentication gating, and the session
//! state the presentation layer renders from.
//!
//! The presentation layer is an external collaborator: it reads the
//! [`store::SharedState`] handle and issues operations through
//! [`commands::Commands`]. Nothing in this crate renders anything.

mod auth;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod logger;
pub mod prefs;
pub mod proto;
pub mod store;

#[cfg(test)]
mod tests;

pub use commands::Commands;
pub use connection::{ConnectionManager, LinkState, Settings};
pub use error::CoreError;
pub use store::{SessionState, SharedState};

pub const DEFAULT_CONTROLLER_HOST: &str = "127.0.0.1";

/// Port of the stateful controller protocol.
pub const DEFAULT_CONTROLLER_PORT: u16 = 8055;

/// Port of the minimal legacy controller variant.
pub const LEGACY_CONTROLLER_PORT: u16 = 2794;

pub const DEFAULT_CONTROLLER_URL: &str = const_format::concatcp!(
    "ws://",
    DEFAULT_CONTROLLER_HOST,
    ":",
    DEFAULT_CONTROLLER_PORT
);
