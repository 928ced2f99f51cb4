// Unit tests for the envelope codec.
// Covers wire-shape guarantees, round-trips, and the failure taxonomy.

use crate::config::Config;
use crate::error::codec::CodecError;
use crate::proto::{PageMessage, Request, Response, TelemetryPatch, decode, encode};

use serde_json::{Map, Value, json};

/// **VALUE**: Verifies zero-argument variants encode as a bare quoted
/// variant name, not a one-key object.
///
/// **WHY THIS MATTERS**: The controller parses `"GetVersion"` and
/// `{"GetVersion": null}` differently; only the bare string form is
/// part of the protocol.
///
/// **BUG THIS CATCHES**: A serde representation change (e.g. adding
/// `tag`/`content` attributes) silently switching the wire shape.
#[test]
fn given_unit_variant_when_encoded_then_bare_string() {
    assert_eq!(encode(&Request::GetVersion).unwrap(), "\"GetVersion\"");
    assert_eq!(encode(&Request::GetStatus).unwrap(), "\"GetStatus\"");
    assert_eq!(encode(&Request::Shutdown).unwrap(), "\"Shutdown\"");
    assert_eq!(encode(&Request::Restart).unwrap(), "\"Restart\"");
    assert_eq!(encode(&Request::DefaultConfig).unwrap(), "\"DefaultConfig\"");
}

/// **VALUE**: Verifies payload variants encode as exactly one key.
#[test]
fn given_payload_variant_when_encoded_then_single_key_object() {
    let text = encode(&Request::SendMessage(PageMessage::new("77", "hi"))).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();

    let object = value.as_object().expect("envelope must be an object");
    assert_eq!(object.len(), 1);
    assert_eq!(object["SendMessage"]["ric"], json!(77));
    assert_eq!(object["SendMessage"]["data"], json!("hi"));
}

/// **VALUE**: Round-trips every outbound variant through its own wire
/// text.
///
/// **WHY THIS MATTERS**: The mock controller in the integration tests
/// (and any Rust controller) deserializes these envelopes with serde;
/// encode and the derived `Deserialize` must agree exactly.
///
/// **BUG THIS CATCHES**: A renamed variant or a payload type change
/// that breaks one direction only.
#[test]
fn given_every_request_when_round_tripped_then_unchanged() {
    let requests = vec![
        Request::SendMessage(PageMessage::new("123", "test page")),
        Request::SetConfig(Config::default()),
        Request::DefaultConfig,
        Request::Authenticate(String::from("hunter2")),
        Request::GetVersion,
        Request::GetConfig,
        Request::GetTelemetry,
        Request::GetTimeslot,
        Request::GetStatus,
        Request::Test,
        Request::Restart,
        Request::Shutdown,
    ];

    for request in requests {
        let text = encode(&request).unwrap();
        let parsed: Request = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, request, "round trip failed for {}", request.tag());
    }
}

/// **VALUE**: Round-trips every inbound variant: serialize with serde
/// (as the controller does), decode with the two-stage decoder.
#[test]
fn given_every_response_when_round_tripped_then_unchanged() {
    let mut telemetry = Map::new();
    telemetry.insert(String::from("node"), json!({"connected": true}));

    let responses = vec![
        Response::Log(3, String::from("transmitter ready")),
        Response::Version(String::from("1.2.3")),
        Response::Config(Config::default()),
        Response::Telemetry(telemetry),
        Response::TelemetryUpdate(json!({"onair": true})),
        Response::Timeslot(7),
        Response::Authenticated(true),
        Response::Message(PageMessage::new("200", "echo")),
        Response::Status(json!({"connected": false, "queue": 0})),
    ];

    for response in responses {
        let text = serde_json::to_string(&response).unwrap();
        let parsed = decode(&text).unwrap();
        assert_eq!(parsed, response, "round trip failed for {text}");
    }
}

/// **VALUE**: Verifies the log envelope's tuple payload decodes as
/// (rank, text).
#[test]
fn given_log_envelope_when_decoded_then_rank_and_text() {
    let parsed = decode(r#"{"Log": [2, "antenna mismatch"]}"#).unwrap();
    assert_eq!(parsed, Response::Log(2, String::from("antenna mismatch")));
}

/// **VALUE**: Verifies the failure taxonomy: unparsable text and
/// wrong envelope shapes are `MalformedEnvelope`, never a panic.
///
/// **WHY THIS MATTERS**: The controller firmware evolves
/// independently of the console; a bad frame must surface on the log
/// path and nowhere else.
#[test]
fn given_bad_frames_when_decoded_then_malformed_envelope() {
    let cases = [
        "not json at all",
        r#"{"Version": "1.0", "Timeslot": 3}"#, // two keys
        "{}",                                   // zero keys
        "42",                                   // not a tagged value
        r#"{"Version": 42}"#,                   // wrong payload type
        r#"{"Telemetry": null}"#,               // wrong payload type
        r#"{"Log": "no tuple"}"#,               // wrong payload shape
    ];

    for raw in cases {
        match decode(raw) {
            Err(CodecError::MalformedEnvelope { .. }) => {}
            other => panic!("expected MalformedEnvelope for {raw}, got {other:?}"),
        }
    }
}

/// **VALUE**: Verifies a well-formed envelope with an unrecognized
/// tag is reported as `UnknownVariant` with the tag preserved.
///
/// **BUG THIS CATCHES**: Folding unknown tags into the malformed
/// bucket, which would hide firmware/console version skew in the
/// diagnostics.
#[test]
fn given_unknown_tag_when_decoded_then_unknown_variant() {
    for raw in [r#"{"Frobnicate": 1}"#, r#""Frobnicate""#] {
        match decode(raw) {
            Err(CodecError::UnknownVariant { tag, .. }) => assert_eq!(tag, "Frobnicate"),
            other => panic!("expected UnknownVariant for {raw}, got {other:?}"),
        }
    }
}

/// **VALUE**: Verifies free-text address coercion: numeric parses,
/// anything else defaults to 0.
#[test]
fn given_address_text_when_coerced_then_numeric_or_zero() {
    assert_eq!(PageMessage::to_address("123"), 123);
    assert_eq!(PageMessage::to_address(" 42 "), 42);
    assert_eq!(PageMessage::to_address("abc"), 0);
    assert_eq!(PageMessage::to_address(""), 0);
    assert_eq!(PageMessage::to_address("-5"), 0);
    assert_eq!(PageMessage::to_address("12.5"), 0);
}

/// **VALUE**: Verifies both observed `TelemetryUpdate` payload shapes
/// decode to the same patch.
///
/// **WHY THIS MATTERS**: Current controllers send a mapping, an older
/// protocol revision sent a `[key, value]` pair; the console supports
/// both populations.
#[test]
fn given_both_update_shapes_when_decoded_then_same_patch() {
    let mapping = TelemetryPatch::from_value(json!({"onair": true})).unwrap();
    let pair = TelemetryPatch::from_value(json!(["onair", true])).unwrap();
    assert_eq!(mapping, pair);
}

#[test]
fn given_bad_update_shapes_when_decoded_then_malformed() {
    let cases = [
        json!(["onair"]),          // one element
        json!([1, true]),          // non-string key
        json!(["a", 1, 2]),        // three elements
        json!("onair"),            // bare scalar
        json!(42),
    ];

    for value in cases {
        match TelemetryPatch::from_value(value.clone()) {
            Err(CodecError::MalformedEnvelope { .. }) => {}
            other => panic!("expected MalformedEnvelope for {value}, got {other:?}"),
        }
    }
}
