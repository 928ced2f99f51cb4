// Unit tests for the session state store: history rings, telemetry
// merge semantics, and what survives a link loss.

use crate::config::Config;
use crate::proto::{PageMessage, TelemetryPatch};
use crate::store::{HISTORY_LIMIT, LogLevel, SessionState};

use serde_json::{Map, Value, json};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// **VALUE**: Verifies the log ring never exceeds its capacity and
/// always holds the most recent records, newest first.
///
/// **WHY THIS MATTERS**: The log panel renders this ring directly; an
/// unbounded ring leaks memory on a chatty controller, a wrong order
/// shows stale entries on top.
///
/// **BUG THIS CATCHES**: push/truncate on the wrong end of the deque.
#[test]
fn given_many_logs_when_pushed_then_ring_holds_newest_first() {
    let mut state = SessionState::new();

    for n in 0..60 {
        state.push_log(LogLevel::Info, format!("entry {n}"));
    }

    assert_eq!(state.logs().len(), HISTORY_LIMIT);
    assert_eq!(state.logs()[0].text, "entry 59");
    assert_eq!(state.logs()[HISTORY_LIMIT - 1].text, "entry 10");
}

/// **VALUE**: Verifies the message ring follows the same discipline
/// as the log ring.
#[test]
fn given_many_messages_when_pushed_then_ring_capped() {
    let mut state = SessionState::new();

    for n in 0..55 {
        state.push_message(PageMessage::new(&n.to_string(), "page"));
    }

    assert_eq!(state.messages().len(), HISTORY_LIMIT);
    assert_eq!(state.messages()[0].ric, 54);
    assert_eq!(state.messages()[HISTORY_LIMIT - 1].ric, 5);
}

/// **VALUE**: Verifies controller log ranks map onto the level enum,
/// with anything unrecognized reporting as info.
#[test]
fn given_log_ranks_when_mapped_then_levels() {
    assert_eq!(LogLevel::from_rank(1), LogLevel::Error);
    assert_eq!(LogLevel::from_rank(2), LogLevel::Warn);
    assert_eq!(LogLevel::from_rank(3), LogLevel::Info);
    assert_eq!(LogLevel::from_rank(4), LogLevel::Debug);
    assert_eq!(LogLevel::from_rank(5), LogLevel::Trace);
    assert_eq!(LogLevel::from_rank(0), LogLevel::Info);
    assert_eq!(LogLevel::from_rank(9), LogLevel::Info);
}

/// **VALUE**: Verifies partial telemetry merge semantics: patched
/// top-level keys are replaced wholesale, unpatched keys untouched.
///
/// **WHY THIS MATTERS**: Controllers send small deltas between full
/// snapshots; wrong merge semantics desynchronize the console from
/// the device until the next full snapshot.
#[test]
fn given_patch_when_merged_then_only_listed_keys_replaced() {
    let mut state = SessionState::new();
    state.replace_telemetry(object(json!({"node": {}, "config": {}})));

    let patch = TelemetryPatch::from_value(json!({"node": {"temp": 42}})).unwrap();
    state.merge_telemetry(patch);

    assert_eq!(
        Value::Object(state.telemetry().clone()),
        json!({"node": {"temp": 42}, "config": {}})
    );
}

/// **VALUE**: Verifies merge idempotence: applying the same patch
/// twice yields the same state as applying it once.
#[test]
fn given_same_patch_twice_when_merged_then_idempotent() {
    let mut once = SessionState::new();
    let mut twice = SessionState::new();
    let snapshot = object(json!({"node": {"temp": 10}, "onair": false}));
    once.replace_telemetry(snapshot.clone());
    twice.replace_telemetry(snapshot);

    let patch = TelemetryPatch::from_value(json!({"onair": true})).unwrap();
    once.merge_telemetry(patch.clone());
    twice.merge_telemetry(patch.clone());
    twice.merge_telemetry(patch);

    assert_eq!(once.telemetry(), twice.telemetry());
}

/// **VALUE**: Verifies what a link loss clears and what it keeps:
/// telemetry is dropped, version/config/history survive.
///
/// **WHY THIS MATTERS**: Telemetry describes a live device and would
/// be stale the moment the link dies; config and version are still
/// the best known values and the operator keeps their history.
#[test]
fn given_link_loss_when_telemetry_cleared_then_rest_survives() {
    let mut state = SessionState::new();
    state.set_version(String::from("1.2.3"));
    state.set_config(Config::default());
    state.push_log(LogLevel::Info, "hello");
    state.replace_telemetry(object(json!({"node": {"connected": true}})));

    state.clear_telemetry();

    assert!(state.telemetry().is_empty());
    assert_eq!(state.version(), Some("1.2.3"));
    assert!(state.config().is_some());
    assert_eq!(state.logs().len(), 1);
}
