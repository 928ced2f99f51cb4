//! User-triggered operations on the controller link.
//!
//! Each command is a thin encode-and-send. Every operation requires
//! an open link; otherwise the command is dropped silently with a
//! debug log. The presentation layer is responsible for disabling
//! controls; the engine only guarantees it will not crash or corrupt
//! state.

use crate::auth::AuthGate;
use crate::config::Config;
use crate::connection::Outbound;
use crate::prefs::{self, KeyValueStore};
use crate::proto::{PageMessage, Request};

use std::sync::Arc;

/// Clonable command facade bound to one [`ConnectionManager`].
///
/// [`ConnectionManager`]: crate::connection::ConnectionManager
#[derive(Clone)]
pub struct Commands {
    outbound: Outbound,
    auth: Arc<AuthGate>,
    store: Arc<dyn KeyValueStore>,
}

impl Commands {
    pub(crate) fn new(
        outbound: Outbound,
        auth: Arc<AuthGate>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            outbound,
            auth,
            store,
        }
    }

    /// Submit a page with default protocol fields. The free-text
    /// address coerces to RIC 0 on non-numeric input and is
    /// remembered for the next session.
    pub async fn send_message(&self, addr: &str, text: &str) {
        self.store.set(prefs::ADDRESS_KEY, addr.trim());
        self.send_page(PageMessage::new(addr, text)).await;
    }

    /// Submit a fully specified page.
    pub async fn send_page(&self, message: PageMessage) {
        self.outbound.send(Request::SendMessage(message)).await;
    }

    /// Push a config document to the controller. `None` is a no-op.
    pub async fn save_config(&self, config: Option<Config>) {
        if let Some(config) = config {
            self.outbound.send(Request::SetConfig(config)).await;
        }
    }

    /// Ask the controller to reset its config to defaults.
    pub async fn reset_config(&self) {
        self.outbound.send(Request::DefaultConfig).await;
    }

    /// Trigger the controller's transmitter self-test.
    pub async fn run_test(&self) {
        self.outbound.send(Request::Test).await;
    }

    /// Ask the controller for its status snapshot. Answered with a
    /// `Status` envelope by the minimal legacy controller variant;
    /// stateful controllers report through `Telemetry` instead.
    pub async fn refresh_status(&self) {
        self.outbound.send(Request::GetStatus).await;
    }

    pub async fn restart(&self) {
        self.outbound.send(Request::Restart).await;
    }

    pub async fn shutdown(&self) {
        self.outbound.send(Request::Shutdown).await;
    }

    /// Re-offer a credential. On acceptance the auth gate persists it
    /// and issues the bootstrap queries.
    pub async fn authenticate(&self, credential: &str) {
        self.auth.offer(credential.to_owned(), &self.outbound).await;
    }

    /// Remembered page address for form prefill, defaulting to 0.
    pub fn remembered_address(&self) -> u32 {
        prefs::remembered_address(self.store.as_ref())
    }
}
