//! JSON bodies returned by the relay's HTTP boundary.

use serde::{Deserialize, Serialize};

use crate::signal::Envelope;

/// Reply to a `join`: the room's membership after the join was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    /// Always `true`.
    pub success: bool,
    /// Peers currently in the room, the joiner included.
    pub participants: Vec<String>,
}

impl JoinResponse {
    /// Builds a successful join reply.
    #[must_use]
    pub const fn new(participants: Vec<String>) -> Self {
        Self {
            success: true,
            participants,
        }
    }
}

/// Plain acknowledgement for `leave`, `offer`, `answer` and `ice-candidate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Always `true`.
    pub success: bool,
}

impl Ack {
    /// The only acknowledgement the relay sends.
    pub const OK: Self = Self { success: true };
}

/// Reply to a poll: everything queued for the peer since its last poll.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PollResponse {
    /// Envelopes in arrival order, each exactly as the sender posted it.
    pub messages: Vec<Envelope>,
}

/// Body of every 4xx reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason naming the offending field or method.
    pub error: String,
}

impl ErrorResponse {
    /// Wraps an error message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Query string of the poll request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollQuery {
    /// Polling peer.
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// Resource usage snapshot of a relay, served on `/stats`.
///
/// Neither rooms nor queues are bounded by default, so these counters are
/// the signal operators watch for peers that never leave or never poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStats {
    /// Rooms with at least one participant.
    pub rooms: usize,
    /// Sum of participants over all rooms.
    pub participants: usize,
    /// Participant count of the most crowded room.
    pub largest_room: usize,
    /// Peers with at least one undelivered envelope.
    pub queues: usize,
    /// Undelivered envelopes over all peers.
    pub queued_envelopes: usize,
    /// Length of the longest queue.
    pub largest_queue: usize,
}
