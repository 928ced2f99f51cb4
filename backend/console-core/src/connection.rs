//! Controller link lifecycle.
//!
//! One driver task owns the transport and the reconnect delay, so "at
//! most one socket, at most one pending reconnect" holds by
//! construction: starting or stopping the manager aborts the driver,
//! which takes any pending delay with it. Inbound envelopes are
//! dispatched through an exhaustive match, so adding a variant to
//! [`Response`] will not compile until it is routed here.

use crate::auth::AuthGate;
use crate::commands::Commands;
use crate::error::connection::ConnectionError;
use crate::prefs::KeyValueStore;
use crate::proto::{self, Request, Response, TelemetryPatch};
use crate::store::{LogLevel, SessionState, SharedState};
use crate::{DEFAULT_CONTROLLER_HOST, DEFAULT_CONTROLLER_PORT};

use common::ErrorLocation;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

/// Delay between reconnect attempts. Tunable via [`Settings`].
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of the controller link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// Connection settings for the controller endpoint.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub reconnect_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_CONTROLLER_HOST.to_owned(),
            port: DEFAULT_CONTROLLER_PORT,
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

impl Settings {
    /// Validated `ws://` endpoint for this host/port pair.
    pub fn endpoint(&self) -> Result<String, ConnectionError> {
        let raw = format!("ws://{}:{}", self.host, self.port);
        Url::parse(&raw).map_err(|e| ConnectionError::InvalidEndpoint {
            message: format!("{raw}: {e}"),
            location: ErrorLocation::caller(),
        })?;
        Ok(raw)
    }
}

/// Handle to the writer task of the currently open transport, if any.
///
/// Commands issued while the link is not open are dropped here with a
/// debug log. They are never buffered and never an error.
#[derive(Clone, Default)]
pub(crate) struct Outbound {
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<Request>>>>,
}

impl Outbound {
    pub(crate) async fn send(&self, request: Request) -> bool {
        let tag = request.tag();
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => {
                if tx.send(request).is_ok() {
                    true
                } else {
                    debug!("Link closing, dropped {tag}");
                    false
                }
            }
            None => {
                debug!("Link not open, dropped {tag}");
                false
            }
        }
    }

    async fn install(&self, tx: mpsc::UnboundedSender<Request>) {
        *self.tx.lock().await = Some(tx);
    }

    async fn clear(&self) {
        *self.tx.lock().await = None;
    }
}

/// Owns the controller link: one transport, one reconnect timer.
///
/// Cheap to clone; all clones drive the same link. The preference
/// store and settings come from the caller; there is no ambient
/// global connection.
#[derive(Clone)]
pub struct ConnectionManager {
    settings: Settings,
    state: SharedState,
    auth: Arc<AuthGate>,
    store: Arc<dyn KeyValueStore>,
    outbound: Outbound,
    driver: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ConnectionManager {
    pub fn new(settings: Settings, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            settings,
            state: SessionState::shared(),
            auth: Arc::new(AuthGate::new(store.clone())),
            store,
            outbound: Outbound::default(),
            driver: Arc::new(Mutex::new(None)),
        }
    }

    /// Read handle for the presentation layer.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Command facade bound to this link.
    pub fn commands(&self) -> Commands {
        Commands::new(self.outbound.clone(), self.auth.clone(), self.store.clone())
    }

    /// Start driving the link. Any previous driver (and its pending
    /// reconnect delay) is invalidated first.
    pub async fn start(&self) -> Result<(), ConnectionError> {
        let endpoint = self.settings.endpoint()?;

        let mut driver = self.driver.lock().await;
        if let Some(previous) = driver.take() {
            previous.abort();
        }
        self.outbound.clear().await;

        let delay = self.settings.reconnect_delay;
        let state = self.state.clone();
        let auth = self.auth.clone();
        let outbound = self.outbound.clone();
        *driver = Some(tokio::spawn(run_link(endpoint, delay, state, auth, outbound)));

        Ok(())
    }

    /// Tear the link down and suppress auto-reconnect.
    pub async fn stop(&self) {
        let mut driver = self.driver.lock().await;
        if let Some(handle) = driver.take() {
            handle.abort();
        }
        self.outbound.clear().await;
        self.state.write().await.set_link(LinkState::Disconnected);
        info!("Controller link stopped");
    }
}

/// The driver task: connect, pump, wait, repeat.
async fn run_link(
    endpoint: String,
    reconnect_delay: Duration,
    state: SharedState,
    auth: Arc<AuthGate>,
    outbound: Outbound,
) {
    loop {
        state.write().await.set_link(LinkState::Connecting);

        match connect_async(endpoint.as_str()).await {
            Ok((transport, _)) => {
                info!("Connected to controller at {endpoint}");
                drive_transport(transport, &state, &auth, &outbound).await;
            }
            Err(e) => {
                state.write().await.set_link(LinkState::Closed);
                warn!("Failed to reach controller at {endpoint}: {e}");
            }
        }

        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Pump one open transport until it closes.
async fn drive_transport(
    transport: Transport,
    state: &SharedState,
    auth: &Arc<AuthGate>,
    outbound: &Outbound,
) {
    let (sink, mut stream) = transport.split();
    let (tx, rx) = mpsc::unbounded_channel();
    outbound.install(tx).await;

    {
        let mut session = state.write().await;
        session.set_link(LinkState::Open);
        session.push_log(LogLevel::Info, "Connected to the controller");
    }

    let writer = tokio::spawn(run_writer(rx, sink));

    auth.on_open(outbound).await;

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => dispatch(text.as_str(), state, auth, outbound).await,
            Ok(Message::Close(_)) => break,
            // Binary/ping/pong are not part of the envelope protocol.
            Ok(_) => {}
            Err(e) => {
                warn!("Transport error: {e}");
                break;
            }
        }
    }

    outbound.clear().await;
    writer.abort();

    let mut session = state.write().await;
    session.set_link(LinkState::Closed);
    session.set_authenticated(false);
    session.clear_telemetry();
    session.push_log(LogLevel::Warn, "Disconnected from the controller");
    warn!("Controller link closed");
}

/// Forward queued requests onto the wire.
async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<Request>,
    mut sink: SplitSink<Transport, Message>,
) {
    while let Some(request) = rx.recv().await {
        let text = match proto::encode(&request) {
            Ok(text) => text,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text.into())).await {
            debug!("Controller sink closed, dropped {}: {e}", request.tag());
            break;
        }
    }
}

/// Decode one inbound frame and route it to the store or the auth
/// gate. Codec failures are diagnostics on the log path, never fatal.
async fn dispatch(text: &str, state: &SharedState, auth: &Arc<AuthGate>, outbound: &Outbound) {
    let response = match proto::decode(text) {
        Ok(response) => response,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    match response {
        Response::Log(rank, line) => {
            state.write().await.push_log(LogLevel::from_rank(rank), line)
        }
        Response::Version(version) => state.write().await.set_version(version),
        Response::Config(config) => state.write().await.set_config(config),
        Response::Telemetry(snapshot) => state.write().await.replace_telemetry(snapshot),
        Response::TelemetryUpdate(value) => match TelemetryPatch::from_value(value) {
            Ok(patch) => state.write().await.merge_telemetry(patch),
            Err(e) => warn!("{e}"),
        },
        Response::Timeslot(slot) => state.write().await.set_timeslot(slot),
        Response::Authenticated(accepted) => {
            auth.on_authenticated(accepted, state, outbound).await
        }
        Response::Message(message) => state.write().await.push_message(message),
        Response::Status(status) => state.write().await.set_status(status),
    }
}
