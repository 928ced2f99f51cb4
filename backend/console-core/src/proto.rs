//! Wire protocol for the controller link.
//!
//! Every message is one JSON value: a bare string for zero-argument
//! variants (`"GetVersion"`) or an object with exactly one key whose
//! name is the variant tag (`{"SendMessage": {...}}`). Serde's
//! externally-tagged enum representation produces exactly this shape,
//! so [`Request`] encoding is a plain derive. Inbound decoding is done
//! in two stages instead of a derived `Deserialize` so that an
//! unknown tag is reported as [`CodecError::UnknownVariant`] rather
//! than being folded into a generic parse error.

use crate::config::Config;
use crate::error::codec::CodecError;

use common::ErrorLocation;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// POCSAG message encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Numeric,
    AlphaNum,
}

/// A page submission, with the controller's protocol defaults
/// (alphanumeric, 1200 bd, function bits 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMessage {
    #[serde(rename = "type")]
    pub kind: PageKind,
    pub speed: u32,
    pub ric: u32,
    pub func: u8,
    pub data: String,
}

impl Default for PageMessage {
    fn default() -> Self {
        Self {
            kind: PageKind::AlphaNum,
            speed: 1200,
            ric: 0,
            func: 3,
            data: String::new(),
        }
    }
}

impl PageMessage {
    /// Build a default-encoded page from a free-text address field.
    pub fn new(addr: &str, data: &str) -> Self {
        Self {
            ric: Self::to_address(addr),
            data: data.to_owned(),
            ..Self::default()
        }
    }

    /// Coerce free-text address input to a RIC, defaulting to 0 on
    /// non-numeric input.
    pub fn to_address(text: &str) -> u32 {
        text.trim().parse().unwrap_or(0)
    }
}

/// Outbound commands and queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    SendMessage(PageMessage),
    SetConfig(Config),
    DefaultConfig,
    Authenticate(String),
    GetVersion,
    GetConfig,
    GetTelemetry,
    GetTimeslot,
    GetStatus,
    Test,
    Restart,
    Shutdown,
}

impl Request {
    /// Variant tag, safe to log (unlike `Debug`, which would expose
    /// the credential carried by `Authenticate`).
    pub fn tag(&self) -> &'static str {
        match self {
            Request::SendMessage(_) => "SendMessage",
            Request::SetConfig(_) => "SetConfig",
            Request::DefaultConfig => "DefaultConfig",
            Request::Authenticate(_) => "Authenticate",
            Request::GetVersion => "GetVersion",
            Request::GetConfig => "GetConfig",
            Request::GetTelemetry => "GetTelemetry",
            Request::GetTimeslot => "GetTimeslot",
            Request::GetStatus => "GetStatus",
            Request::Test => "Test",
            Request::Restart => "Restart",
            Request::Shutdown => "Shutdown",
        }
    }
}

/// Inbound envelopes. Telemetry and status documents stay opaque JSON:
/// their field meaning belongs to the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Response {
    Log(u8, String),
    Version(String),
    Config(Config),
    Telemetry(Map<String, Value>),
    TelemetryUpdate(Value),
    Timeslot(u8),
    Authenticated(bool),
    Message(PageMessage),
    Status(Value),
}

/// Partial telemetry update: top-level keys to replace in place.
///
/// Two payload shapes exist in the field. Current controllers send a
/// mapping of keys to values; an earlier protocol revision sent a
/// single `[key, value]` pair. Both decode to the same patch.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPatch(pub Map<String, Value>);

impl TelemetryPatch {
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Array(mut pair) if pair.len() == 2 => {
                let entry = pair.pop().unwrap_or(Value::Null);
                match pair.pop() {
                    Some(Value::String(key)) => {
                        let mut map = Map::new();
                        map.insert(key, entry);
                        Ok(Self(map))
                    }
                    other => Err(malformed(
                        &Value::Array(vec![other.unwrap_or(Value::Null), entry]).to_string(),
                        "telemetry update pair key must be a string",
                    )),
                }
            }
            other => Err(malformed(
                &other.to_string(),
                "telemetry update must be a mapping or a [key, value] pair",
            )),
        }
    }
}

/// Serialize an outbound request to wire text.
pub fn encode(request: &Request) -> Result<String, CodecError> {
    serde_json::to_string(request).map_err(|e| CodecError::Encode {
        message: format!("{}: {e}", request.tag()),
        location: ErrorLocation::caller(),
    })
}

/// Parse one inbound envelope.
///
/// The decode never panics and never kills the link: shape problems
/// come back as [`CodecError::MalformedEnvelope`] (with the raw text
/// for the log path) and unrecognized tags as
/// [`CodecError::UnknownVariant`].
pub fn decode(text: &str) -> Result<Response, CodecError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| malformed(text, &e.to_string()))?;

    let (tag, payload) = match value {
        Value::String(tag) => (tag, None),
        Value::Object(map) => {
            if map.len() != 1 {
                return Err(malformed(
                    text,
                    &format!("expected exactly one envelope key, found {}", map.len()),
                ));
            }
            match map.into_iter().next() {
                Some((tag, payload)) => (tag, Some(payload)),
                None => return Err(malformed(text, "expected exactly one envelope key")),
            }
        }
        _ => return Err(malformed(text, "envelope must be a string or an object")),
    };

    match tag.as_str() {
        "Log" => {
            let (rank, line): (u8, String) = payload_as(&tag, payload, text)?;
            Ok(Response::Log(rank, line))
        }
        "Version" => Ok(Response::Version(payload_as(&tag, payload, text)?)),
        "Config" => Ok(Response::Config(payload_as(&tag, payload, text)?)),
        "Telemetry" => Ok(Response::Telemetry(payload_as(&tag, payload, text)?)),
        "TelemetryUpdate" => Ok(Response::TelemetryUpdate(required(&tag, payload, text)?)),
        "Timeslot" => Ok(Response::Timeslot(payload_as(&tag, payload, text)?)),
        "Authenticated" => Ok(Response::Authenticated(payload_as(&tag, payload, text)?)),
        "Message" => Ok(Response::Message(payload_as(&tag, payload, text)?)),
        "Status" => Ok(Response::Status(required(&tag, payload, text)?)),
        _ => Err(CodecError::UnknownVariant {
            tag,
            location: ErrorLocation::caller(),
        }),
    }
}

#[track_caller]
fn malformed(raw: &str, reason: &str) -> CodecError {
    CodecError::MalformedEnvelope {
        raw: raw.to_owned(),
        reason: reason.to_owned(),
        location: ErrorLocation::caller(),
    }
}

#[track_caller]
fn required(tag: &str, payload: Option<Value>, raw: &str) -> Result<Value, CodecError> {
    payload.ok_or_else(|| malformed(raw, &format!("variant {tag} requires a payload")))
}

#[track_caller]
fn payload_as<T: DeserializeOwned>(
    tag: &str,
    payload: Option<Value>,
    raw: &str,
) -> Result<T, CodecError> {
    let value = required(tag, payload, raw)?;
    serde_json::from_value(value).map_err(|e| malformed(raw, &format!("bad {tag} payload: {e}")))
}
