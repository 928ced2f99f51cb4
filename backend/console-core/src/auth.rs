//! Authentication gating for the controller link.
//!
//! The controller answers nothing but `Authenticated` until a
//! credential has been accepted, so the gate's offer is always the
//! first message on a fresh transport. Auth state is
//! connection-scoped: every reconnect re-authenticates with the
//! persisted credential.

use crate::connection::Outbound;
use crate::prefs::{self, KeyValueStore};
use crate::proto::Request;
use crate::store::SharedState;

use std::sync::Arc;

use common::RedactedCredential;
use log::{debug, info, warn};
use tokio::sync::Mutex;

/// Queries auto-issued once the controller accepts the credential.
const BOOTSTRAP_QUERIES: [Request; 4] = [
    Request::GetVersion,
    Request::GetConfig,
    Request::GetTelemetry,
    Request::GetTimeslot,
];

pub struct AuthGate {
    store: Arc<dyn KeyValueStore>,
    /// The credential most recently offered on the wire; persisted
    /// only once the controller accepts it.
    offered: Mutex<RedactedCredential>,
}

impl AuthGate {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            offered: Mutex::new(RedactedCredential::default()),
        }
    }

    /// First action on every fresh transport: offer the stored
    /// credential (empty string if none is persisted).
    pub async fn on_open(&self, outbound: &Outbound) {
        let credential = self.store.get(prefs::CREDENTIAL_KEY).unwrap_or_default();
        self.offer(credential, outbound).await;
    }

    /// Send an `Authenticate` request and remember what was offered.
    ///
    /// The record is written before the request is queued, so a
    /// verdict can never race ahead of it and persist a stale
    /// credential.
    pub async fn offer(&self, credential: String, outbound: &Outbound) {
        debug!("Offering credential ({} chars)", credential.len());
        *self.offered.lock().await = RedactedCredential::new(credential.clone());
        outbound.send(Request::Authenticate(credential)).await;
    }

    /// Handle the controller's `Authenticated` verdict.
    ///
    /// Acceptance persists the offered credential and fires the
    /// bootstrap queries; rejection clears the stored credential so
    /// the operator is prompted again.
    pub async fn on_authenticated(
        &self,
        accepted: bool,
        state: &SharedState,
        outbound: &Outbound,
    ) {
        state.write().await.set_authenticated(accepted);

        if accepted {
            let offered = self.offered.lock().await;
            self.store.set(prefs::CREDENTIAL_KEY, offered.as_str());
            info!("Controller accepted credentials, requesting session state");

            for query in BOOTSTRAP_QUERIES {
                outbound.send(query).await;
            }
        } else {
            self.store.remove(prefs::CREDENTIAL_KEY);
            warn!("Controller rejected credentials, stored credential cleared");
        }
    }
}
