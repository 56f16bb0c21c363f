//! Signaling request types and validation.
//!
//! Peers post JSON objects shaped like `{ type, from, to?, roomId?, data? }`.
//! [`Signal::parse`] turns one into a closed [`Signal`] variant. Offers,
//! answers and ICE candidates keep the original object verbatim inside an
//! [`Envelope`] so the relay can hand it to the recipient unmodified. The
//! relay never looks inside `data`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Room used by `join`/`leave` when the request omits `roomId`.
pub const DEFAULT_ROOM: &str = "default";

/// Wire field names.
pub mod field {
    /// Message kind.
    pub const TYPE: &str = "type";
    /// Originating peer.
    pub const FROM: &str = "from";
    /// Destination peer (offer/answer/candidate only).
    pub const TO: &str = "to";
    /// Room identifier (join/leave only).
    pub const ROOM_ID: &str = "roomId";
    /// Opaque negotiation payload.
    pub const DATA: &str = "data";
    /// Poll query parameter naming the polling peer.
    pub const USER_ID: &str = "userId";
}

/// Errors produced while validating an incoming signaling request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// The request body was valid JSON but not an object.
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// A field required for this message kind is absent, null or empty.
    #[error("{0} required")]
    MissingField(&'static str),

    /// A field is present but has the wrong JSON type.
    #[error("{field} must be {expected}")]
    InvalidField {
        /// Wire name of the offending field.
        field: &'static str,
        /// Human-readable description of the accepted shape.
        expected: &'static str,
    },

    /// The `type` field names no known message kind.
    #[error("Invalid message type: {0}")]
    UnknownKind(String),

    /// A presence message was offered where only relayable envelopes fit.
    #[error("{0} messages are never relayed to a peer")]
    NotRelayable(SignalKind),
}

/// The five message kinds understood by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Enter a room.
    Join,
    /// Leave a room.
    Leave,
    /// Session description offer.
    Offer,
    /// Session description answer.
    Answer,
    /// Connectivity candidate.
    IceCandidate,
}

impl SignalKind {
    /// Wire spelling of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
        }
    }

    /// Whether messages of this kind are queued for a destination peer.
    #[must_use]
    pub const fn is_relayed(self) -> bool {
        matches!(self, Self::Offer | Self::Answer | Self::IceCandidate)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(Self::Join),
            "leave" => Ok(Self::Leave),
            "offer" => Ok(Self::Offer),
            "answer" => Ok(Self::Answer),
            "ice-candidate" | "candidate" => Ok(Self::IceCandidate),
            other => Err(SignalError::UnknownKind(other.to_string())),
        }
    }
}

/// Room presence change requested by a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    /// Peer entering or leaving.
    pub from: String,
    /// Target room, [`DEFAULT_ROOM`] when the request omitted it.
    pub room: String,
}

/// A validated offer, answer or ICE candidate addressed to one peer.
///
/// Holds the request object exactly as received. Serializing an envelope
/// yields that object again, unknown fields included, so recipients see
/// byte-for-byte what the sender posted (modulo JSON whitespace).
///
/// Envelopes can only be obtained through validation, which is what keeps
/// presence messages out of peer queues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kind: SignalKind,
    from: String,
    to: String,
    body: Map<String, Value>,
}

impl Envelope {
    fn new(kind: SignalKind, from: String, body: Map<String, Value>) -> Result<Self, SignalError> {
        let to = required_str(&body, field::TO)?.to_string();
        if body.get(field::DATA).is_none_or(Value::is_null) {
            return Err(SignalError::MissingField(field::DATA));
        }
        Ok(Self {
            kind,
            from,
            to,
            body,
        })
    }

    /// Message kind; always one of the relayed kinds.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Sender peer id.
    #[must_use]
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient peer id.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Opaque payload.
    #[must_use]
    pub fn data(&self) -> &Value {
        self.body.get(field::DATA).unwrap_or(&Value::Null)
    }

    /// The original request object.
    #[must_use]
    pub const fn as_object(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Consumes the envelope, returning the original request object.
    #[must_use]
    pub fn into_object(self) -> Map<String, Value> {
        self.body
    }
}

impl TryFrom<Value> for Envelope {
    type Error = SignalError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match Signal::parse(value)? {
            Signal::Offer(envelope) | Signal::Answer(envelope) | Signal::IceCandidate(envelope) => {
                Ok(envelope)
            }
            Signal::Join(_) => Err(SignalError::NotRelayable(SignalKind::Join)),
            Signal::Leave(_) => Err(SignalError::NotRelayable(SignalKind::Leave)),
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// A validated signaling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Add `from` to a room.
    Join(Presence),
    /// Remove `from` from a room.
    Leave(Presence),
    /// Relay a session offer.
    Offer(Envelope),
    /// Relay a session answer.
    Answer(Envelope),
    /// Relay a connectivity candidate.
    IceCandidate(Envelope),
}

impl Signal {
    /// Validates a decoded request body.
    ///
    /// Checks run in wire order: `type`, then `from`, then the fields the
    /// kind requires. Nothing is inferred beyond the `roomId` default.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] naming the first missing or malformed field,
    /// or [`SignalError::UnknownKind`] for an unrecognized `type`.
    pub fn parse(value: Value) -> Result<Self, SignalError> {
        let Value::Object(body) = value else {
            return Err(SignalError::NotAnObject);
        };

        let kind: SignalKind = required_str(&body, field::TYPE)?.parse()?;
        let from = required_str(&body, field::FROM)?.to_string();

        let signal = match kind {
            SignalKind::Join => Self::Join(presence(&body, from)?),
            SignalKind::Leave => Self::Leave(presence(&body, from)?),
            SignalKind::Offer => Self::Offer(Envelope::new(kind, from, body)?),
            SignalKind::Answer => Self::Answer(Envelope::new(kind, from, body)?),
            SignalKind::IceCandidate => Self::IceCandidate(Envelope::new(kind, from, body)?),
        };
        Ok(signal)
    }

    /// Kind of this request.
    #[must_use]
    pub const fn kind(&self) -> SignalKind {
        match self {
            Self::Join(_) => SignalKind::Join,
            Self::Leave(_) => SignalKind::Leave,
            Self::Offer(_) => SignalKind::Offer,
            Self::Answer(_) => SignalKind::Answer,
            Self::IceCandidate(_) => SignalKind::IceCandidate,
        }
    }

    /// Originating peer id.
    #[must_use]
    pub fn from(&self) -> &str {
        match self {
            Self::Join(p) | Self::Leave(p) => &p.from,
            Self::Offer(e) | Self::Answer(e) | Self::IceCandidate(e) => e.from(),
        }
    }
}

impl TryFrom<Value> for Signal {
    type Error = SignalError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

fn presence(body: &Map<String, Value>, from: String) -> Result<Presence, SignalError> {
    let room = match body.get(field::ROOM_ID) {
        None | Some(Value::Null) => DEFAULT_ROOM.to_string(),
        Some(Value::String(s)) if s.is_empty() => DEFAULT_ROOM.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(SignalError::InvalidField {
                field: field::ROOM_ID,
                expected: "a string",
            });
        }
    };
    Ok(Presence { from, room })
}

fn required_str<'a>(body: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, SignalError> {
    match body.get(name) {
        None | Some(Value::Null) => Err(SignalError::MissingField(name)),
        Some(Value::String(s)) if s.is_empty() => Err(SignalError::MissingField(name)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(SignalError::InvalidField {
            field: name,
            expected: "a string",
        }),
    }
}
