use crate::session_tests::helpers::{
    MockController, eventually, test_manager,
};

use console_core::LinkState;
use console_core::config::Config;
use console_core::prefs::{ADDRESS_KEY, CREDENTIAL_KEY, KeyValueStore};
use console_core::proto::{PageMessage, Request, Response};

use std::time::Duration;

use serde_json::{Value, json};

/// **VALUE**: Verifies the auth gate sequencing: `Authenticate` is
/// the first message on a fresh link and no bootstrap query leaves
/// the console before the controller accepts.
///
/// **WHY THIS MATTERS**: The controller answers nothing but
/// `Authenticated` until a credential is accepted; a query sent early
/// is silently eaten and the console would render an empty session.
///
/// **BUG THIS CATCHES**: Bootstrap queries fired from the open
/// handler instead of the auth verdict handler.
#[tokio::test]
async fn given_fresh_link_when_connected_then_auth_precedes_bootstrap() {
    let mock = MockController::bind(18061).await;
    let (manager, _prefs) = test_manager(18061);
    manager.start().await.expect("start");

    let mut link = mock.accept().await;

    // First message must be Authenticate, with the empty default
    // credential (nothing persisted yet).
    match link.next_request().await {
        Request::Authenticate(credential) => assert_eq!(credential, ""),
        other => panic!("Expected Authenticate first, got {}", other.tag()),
    }

    // Nothing else until the verdict.
    assert!(
        link.try_next_request(Duration::from_millis(300)).await.is_none(),
        "No query may be sent before Authenticated(true)"
    );

    link.send(&Response::Authenticated(true)).await;

    let queries = link.drain_bootstrap().await;
    assert_eq!(
        queries,
        vec![
            Request::GetVersion,
            Request::GetConfig,
            Request::GetTelemetry,
            Request::GetTimeslot,
        ]
    );

    manager.stop().await;
}

/// **VALUE**: Verifies inbound envelopes land in the store: version,
/// timeslot, logs, message echoes, status. Malformed or unknown
/// frames in between must be absorbed without killing the link.
///
/// **WHY THIS MATTERS**: The presentation layer renders only what the
/// store holds; this is the full inbound routing path over a real
/// socket. Resilience matters because controller firmware evolves
/// independently of the console.
#[tokio::test]
async fn given_open_session_when_envelopes_arrive_then_store_synchronized() {
    let mock = MockController::bind(18062).await;
    let (manager, _prefs) = test_manager(18062);
    manager.start().await.expect("start");

    let mut link = mock.accept().await;
    link.accept_auth().await;
    link.drain_bootstrap().await;

    let state = manager.state();
    eventually("authenticated flag", || {
        let state = state.clone();
        async move {
            let session = state.read().await;
            session.is_authenticated() && session.link() == LinkState::Open
        }
    })
    .await;

    // Hostile input first: neither frame may disturb the session.
    link.send_raw("this is not an envelope").await;
    link.send_raw(r#"{"Wobble": {"x": 1}}"#).await;

    link.send(&Response::Version(String::from("1.2.3"))).await;
    link.send(&Response::Timeslot(5)).await;
    link.send(&Response::Log(2, String::from("antenna mismatch"))).await;
    link.send(&Response::Message(PageMessage::new("200", "echo"))).await;
    link.send(&Response::Status(json!({"connected": true}))).await;

    eventually("store synchronization", || {
        let state = state.clone();
        async move {
            let session = state.read().await;
            session.version() == Some("1.2.3")
                && session.timeslot() == Some(5)
                && session.status() == Some(&json!({"connected": true}))
                && session.logs().iter().any(|r| r.text == "antenna mismatch")
                && session.messages().front().map(|m| m.ric) == Some(200)
        }
    })
    .await;

    manager.stop().await;
}

/// **VALUE**: Verifies the two telemetry update modes over the wire:
/// a full snapshot replaces wholesale, partial updates (both payload
/// shapes) replace only the listed top-level keys.
#[tokio::test]
async fn given_snapshot_then_patches_when_applied_then_merged_state() {
    let mock = MockController::bind(18063).await;
    let (manager, _prefs) = test_manager(18063);
    manager.start().await.expect("start");

    let mut link = mock.accept().await;
    link.accept_auth().await;
    link.drain_bootstrap().await;

    link.send_raw(r#"{"Telemetry": {"node": {}, "config": {}}}"#).await;
    link.send_raw(r#"{"TelemetryUpdate": {"node": {"temp": 42}}}"#).await;
    // Legacy single-pair shape.
    link.send_raw(r#"{"TelemetryUpdate": ["onair", true]}"#).await;

    let state = manager.state();
    eventually("telemetry merge", || {
        let state = state.clone();
        async move {
            let session = state.read().await;
            Value::Object(session.telemetry().clone())
                == json!({"node": {"temp": 42}, "config": {}, "onair": true})
        }
    })
    .await;

    manager.stop().await;
}

/// **VALUE**: Verifies loss handling end to end: telemetry and the
/// auth flag reset, version/config/history survive, a synthetic
/// disconnect entry lands in the log ring, and exactly one reconnect
/// attempt follows, re-authenticating from scratch.
///
/// **BUG THIS CATCHES**: Duplicate reconnect timers (two connections
/// after one drop), state wiped too broadly, or a reconnect that
/// skips the auth gate.
#[tokio::test]
async fn given_controller_drop_when_link_closes_then_reset_and_single_reconnect() {
    let mock = MockController::bind(18064).await;
    let (manager, _prefs) = test_manager(18064);
    manager.start().await.expect("start");

    let mut link = mock.accept().await;
    link.accept_auth().await;
    link.drain_bootstrap().await;
    link.send(&Response::Version(String::from("2.0.0"))).await;
    link.send(&Response::Config(Config::default())).await;
    link.send_raw(r#"{"Telemetry": {"node": {"connected": true}}}"#).await;

    let state = manager.state();
    eventually("telemetry populated", || {
        let state = state.clone();
        async move { !state.read().await.telemetry().is_empty() }
    })
    .await;

    link.close().await;

    eventually("post-close state", || {
        let state = state.clone();
        async move {
            let session = state.read().await;
            session.telemetry().is_empty()
                && !session.is_authenticated()
                && session.version() == Some("2.0.0")
                && session.config().is_some()
                && session
                    .logs()
                    .iter()
                    .any(|r| r.text == "Disconnected from the controller")
        }
    })
    .await;

    // Exactly one reconnect, and it re-authenticates.
    let mut second = mock.accept().await;
    match second.next_request().await {
        Request::Authenticate(_) => {}
        other => panic!("Expected re-auth on reconnect, got {}", other.tag()),
    }
    assert!(
        mock.try_accept(Duration::from_millis(200)).await.is_none(),
        "Only one reconnect attempt may be pending"
    );

    manager.stop().await;
}

/// **VALUE**: Verifies credential rejection: the stored credential is
/// offered, cleared on rejection, and no bootstrap query follows.
#[tokio::test]
async fn given_rejected_credentials_when_answered_then_cleared_and_quiet() {
    let mock = MockController::bind(18065).await;
    let (manager, prefs) = test_manager(18065);
    prefs.set(CREDENTIAL_KEY, "hunter2");
    manager.start().await.expect("start");

    let mut link = mock.accept().await;
    match link.next_request().await {
        Request::Authenticate(credential) => assert_eq!(credential, "hunter2"),
        other => panic!("Expected Authenticate, got {}", other.tag()),
    }

    link.send(&Response::Authenticated(false)).await;

    eventually("credential cleared", || {
        let prefs = prefs.clone();
        let state = manager.state();
        async move {
            prefs.get(CREDENTIAL_KEY).is_none() && !state.read().await.is_authenticated()
        }
    })
    .await;

    assert!(
        link.try_next_request(Duration::from_millis(300)).await.is_none(),
        "A rejected session must not issue bootstrap queries"
    );

    manager.stop().await;
}

/// **VALUE**: Verifies the command facade end to end: each operation
/// produces its envelope, the page address coerces to 0 on
/// non-numeric input, the raw address is remembered, and a credential
/// accepted after `authenticate()` is persisted.
#[tokio::test]
async fn given_open_session_when_commands_issued_then_envelopes_on_wire() {
    let mock = MockController::bind(18066).await;
    let (manager, prefs) = test_manager(18066);
    manager.start().await.expect("start");

    let mut link = mock.accept().await;
    link.accept_auth().await;
    link.drain_bootstrap().await;

    let commands = manager.commands();

    commands.send_message("abc", "hello world").await;
    match link.next_request().await {
        Request::SendMessage(message) => {
            assert_eq!(message.ric, 0, "non-numeric address must coerce to 0");
            assert_eq!(message.data, "hello world");
        }
        other => panic!("Expected SendMessage, got {}", other.tag()),
    }
    assert_eq!(prefs.get(ADDRESS_KEY), Some(String::from("abc")));
    assert_eq!(commands.remembered_address(), 0);

    commands.save_config(None).await; // no-op
    commands.save_config(Some(Config::default())).await;
    commands.reset_config().await;
    commands.run_test().await;
    commands.refresh_status().await;
    commands.restart().await;
    commands.shutdown().await;

    assert_eq!(
        link.next_request().await,
        Request::SetConfig(Config::default())
    );
    assert_eq!(link.next_request().await, Request::DefaultConfig);
    assert_eq!(link.next_request().await, Request::Test);
    assert_eq!(link.next_request().await, Request::GetStatus);
    assert_eq!(link.next_request().await, Request::Restart);
    assert_eq!(link.next_request().await, Request::Shutdown);

    commands.authenticate("secret").await;
    match link.next_request().await {
        Request::Authenticate(credential) => assert_eq!(credential, "secret"),
        other => panic!("Expected Authenticate, got {}", other.tag()),
    }
    link.send(&Response::Authenticated(true)).await;

    eventually("credential persisted", || {
        let prefs = prefs.clone();
        async move { prefs.get(CREDENTIAL_KEY) == Some(String::from("secret")) }
    })
    .await;

    manager.stop().await;
}

/// **VALUE**: Verifies an acceptance always persists the credential
/// most recently offered, even when the verdict crosses the
/// `Authenticate` request in flight.
///
/// **WHY THIS MATTERS**: The offer is recorded before the request is
/// queued; a verdict handled between the two would otherwise persist
/// the stale credential from the previous offer.
#[tokio::test]
async fn given_immediate_verdict_when_reoffered_then_latest_credential_persisted() {
    let mock = MockController::bind(18068).await;
    let (manager, prefs) = test_manager(18068);
    prefs.set(CREDENTIAL_KEY, "stale");
    manager.start().await.expect("start");

    let mut link = mock.accept().await;
    assert_eq!(link.accept_auth().await, "stale");
    link.drain_bootstrap().await;

    // Answer without waiting for the new request to surface.
    manager.commands().authenticate("fresh").await;
    link.send(&Response::Authenticated(true)).await;

    eventually("latest credential persisted", || {
        let prefs = prefs.clone();
        async move { prefs.get(CREDENTIAL_KEY) == Some(String::from("fresh")) }
    })
    .await;

    match link.next_request().await {
        Request::Authenticate(credential) => assert_eq!(credential, "fresh"),
        other => panic!("Expected Authenticate, got {}", other.tag()),
    }

    manager.stop().await;
}

/// **VALUE**: Verifies silent rejection and clean shutdown: commands
/// without an open link are dropped without panicking, and `stop()`
/// suppresses the auto-reconnect for good.
///
/// **BUG THIS CATCHES**: A send on a dead link unwrapping a channel
/// error, or a stop that leaves the reconnect timer armed.
#[tokio::test]
async fn given_stopped_manager_when_commands_issued_then_dropped_and_no_reconnect() {
    let mock = MockController::bind(18067).await;
    let (manager, _prefs) = test_manager(18067);

    // Never started: every command is a silent no-op.
    let commands = manager.commands();
    commands.send_message("1", "dropped").await;
    commands.shutdown().await;

    manager.start().await.expect("start");
    let mut link = mock.accept().await;
    link.accept_auth().await;
    link.drain_bootstrap().await;

    manager.stop().await;

    // After stop: still silent, and nobody reconnects.
    commands.send_message("1", "dropped").await;
    assert!(
        mock.try_accept(Duration::from_millis(300)).await.is_none(),
        "stop() must cancel the reconnect loop"
    );
    assert_eq!(manager.state().read().await.link(), LinkState::Disconnected);
}
