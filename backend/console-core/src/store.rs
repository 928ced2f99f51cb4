//! Session state store.
//!
//! Single source of truth for everything the presentation layer
//! renders: link state, auth flag, controller version, config
//! document, telemetry snapshot, current timeslot, and the bounded
//! log/message history rings. The store exclusively owns its data;
//! the UI holds a [`SharedState`] read handle and never mutates
//! directly; all mutation arrives through inbound envelopes or the
//! command facade.

use crate::config::Config;
use crate::connection::LinkState;
use crate::proto::{PageMessage, TelemetryPatch};

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// Capacity of the log and message history rings.
pub const HISTORY_LIMIT: usize = 50;

/// Log severity as ranked by the controller (1 = error .. 5 = trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map a controller rank to a level. Unknown ranks report as
    /// `Info` rather than being rejected.
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        write!(f, "{name}")
    }
}

/// One entry in the log history ring.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub text: String,
}

/// Shared read handle to the session state.
pub type SharedState = Arc<RwLock<SessionState>>;

#[derive(Debug, Default)]
pub struct SessionState {
    link: LinkState,
    authenticated: bool,
    version: Option<String>,
    config: Option<Config>,
    telemetry: Map<String, Value>,
    timeslot: Option<u8>,
    status: Option<Value>,
    logs: VecDeque<LogRecord>,
    messages: VecDeque<PageMessage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::new()))
    }

    // ---- mutators (inbound envelopes and lifecycle events) ----

    /// Push a log record, most recent first, dropping the oldest
    /// beyond [`HISTORY_LIMIT`].
    pub fn push_log(&mut self, level: LogLevel, text: impl Into<String>) {
        self.logs.push_front(LogRecord {
            level,
            text: text.into(),
        });
        self.logs.truncate(HISTORY_LIMIT);
    }

    /// Push an accepted page echo, same ring discipline as the log.
    pub fn push_message(&mut self, message: PageMessage) {
        self.messages.push_front(message);
        self.messages.truncate(HISTORY_LIMIT);
    }

    pub fn set_link(&mut self, link: LinkState) {
        self.link = link;
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    pub fn set_version(&mut self, version: String) {
        self.version = Some(version);
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = Some(config);
    }

    pub fn set_timeslot(&mut self, timeslot: u8) {
        self.timeslot = Some(timeslot);
    }

    pub fn set_status(&mut self, status: Value) {
        self.status = Some(status);
    }

    /// Replace the whole telemetry snapshot.
    pub fn replace_telemetry(&mut self, snapshot: Map<String, Value>) {
        self.telemetry = snapshot;
    }

    /// Apply a partial update: each patched top-level key is replaced
    /// in place, keys absent from the patch are untouched.
    pub fn merge_telemetry(&mut self, patch: TelemetryPatch) {
        for (key, value) in patch.0 {
            self.telemetry.insert(key, value);
        }
    }

    /// Drop the telemetry snapshot (on link loss). Version, config
    /// and the history rings survive reconnects.
    pub fn clear_telemetry(&mut self) {
        self.telemetry.clear();
    }

    // ---- read access for the presentation layer ----

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn telemetry(&self) -> &Map<String, Value> {
        &self.telemetry
    }

    pub fn timeslot(&self) -> Option<u8> {
        self.timeslot
    }

    pub fn status(&self) -> Option<&Value> {
        self.status.as_ref()
    }

    pub fn logs(&self) -> &VecDeque<LogRecord> {
        &self.logs
    }

    pub fn messages(&self) -> &VecDeque<PageMessage> {
        &self.messages
    }
}
