// Unit tests for the controller config document.

use crate::config::{Config, Transmitter};

/// **VALUE**: Verifies the config document round-trips through JSON
/// unchanged, since `SetConfig` sends back exactly what was received.
#[test]
fn given_default_config_when_round_tripped_then_unchanged() {
    let config = Config::default();
    let text = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

/// **VALUE**: Verifies documents from unknown firmware decode: every
/// section defaults, so an empty object is a valid config.
///
/// **BUG THIS CATCHES**: A section missing `#[serde(default)]`, which
/// would make the console reject configs from older controllers.
#[test]
fn given_empty_document_when_decoded_then_defaults() {
    let parsed: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(parsed, Config::default());
    assert_eq!(parsed.transmitter, Transmitter::Dummy);
}

/// **VALUE**: Verifies partial documents keep their explicit values
/// and default the rest.
#[test]
fn given_partial_document_when_decoded_then_mixed() {
    let parsed: Config = serde_json::from_str(
        r#"{"master": {"call": "DL1ABC"}, "transmitter": "C9000"}"#,
    )
    .unwrap();

    assert_eq!(parsed.master.call, "DL1ABC");
    assert_eq!(parsed.master.port, 43434);
    assert_eq!(parsed.transmitter, Transmitter::C9000);
    assert_eq!(parsed.audio, Config::default().audio);
}
