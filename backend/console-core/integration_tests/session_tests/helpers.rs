//! Test helpers: an in-process mock controller speaking the envelope
//! protocol, plus a console manager wired to it.

use console_core::connection::{ConnectionManager, Settings};
use console_core::prefs::MemoryStore;
use console_core::proto::{Request, Response};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// A controller stand-in listening on a test port.
pub struct MockController {
    listener: TcpListener,
}

impl MockController {
    pub async fn bind(port: u16) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .expect("Failed to bind mock controller");
        Self { listener }
    }

    /// Wait for the console to connect.
    pub async fn accept(&self) -> ControllerLink {
        self.try_accept(RECV_TIMEOUT)
            .await
            .expect("Timed out waiting for the console to connect")
    }

    /// `None` if no console connects within `wait`.
    pub async fn try_accept(&self, wait: Duration) -> Option<ControllerLink> {
        match timeout(wait, self.listener.accept()).await {
            Ok(Ok((stream, _))) => {
                let ws = accept_async(stream)
                    .await
                    .expect("WebSocket handshake failed");
                Some(ControllerLink { ws })
            }
            _ => None,
        }
    }
}

/// One accepted console connection, seen from the controller side.
pub struct ControllerLink {
    ws: WebSocketStream<TcpStream>,
}

impl ControllerLink {
    /// Next decoded request from the console under test.
    pub async fn next_request(&mut self) -> Request {
        self.try_next_request(RECV_TIMEOUT)
            .await
            .expect("Timed out waiting for a request")
    }

    /// `None` when nothing arrives within `wait` (or the link dies).
    pub async fn try_next_request(&mut self, wait: Duration) -> Option<Request> {
        loop {
            let frame = match timeout(wait, self.ws.next()).await {
                Ok(Some(Ok(frame))) => frame,
                _ => return None,
            };

            if let Message::Text(text) = frame {
                return Some(serde_json::from_str(text.as_str()).expect("Invalid request JSON"));
            }
        }
    }

    pub async fn send(&mut self, response: &Response) {
        let text = serde_json::to_string(response).expect("Failed to encode response");
        self.send_raw(&text).await;
    }

    /// Send an arbitrary text frame, valid envelope or not.
    pub async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .expect("Failed to send frame");
    }

    /// Accept whatever credential the console offers first.
    pub async fn accept_auth(&mut self) -> String {
        match self.next_request().await {
            Request::Authenticate(credential) => {
                self.send(&Response::Authenticated(true)).await;
                credential
            }
            other => panic!("Expected Authenticate first, got {}", other.tag()),
        }
    }

    /// Collect the four bootstrap queries issued after acceptance.
    pub async fn drain_bootstrap(&mut self) -> Vec<Request> {
        let mut queries = Vec::new();
        for _ in 0..4 {
            queries.push(self.next_request().await);
        }
        queries
    }

    pub async fn close(mut self) {
        self.ws.close(None).await.ok();
    }
}

/// Console settings pointed at a test port, with a short reconnect
/// delay so reconnect tests finish quickly.
pub fn test_settings(port: u16) -> Settings {
    Settings {
        host: String::from("127.0.0.1"),
        port,
        reconnect_delay: Duration::from_millis(50),
    }
}

pub fn test_manager(port: u16) -> (ConnectionManager, Arc<MemoryStore>) {
    let prefs = Arc::new(MemoryStore::new());
    let manager = ConnectionManager::new(test_settings(port), prefs.clone());
    (manager, prefs)
}

/// Poll an async condition until it holds or two seconds elapse.
pub async fn eventually<F, Fut>(what: &str, mut probe: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if probe().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Timed out waiting for {what}");
}
