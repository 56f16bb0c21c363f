//! Relay service core: validation and dispatch of signaling requests.
//!
//! [`RelayService`] owns the two stores. A `join` or `leave` updates room
//! membership; an offer, answer or ICE candidate is appended to the
//! recipient's queue; a poll drains that queue. Each request maps to exactly
//! one store operation and nothing is carried between requests.

use std::sync::Arc;

use serde_json::Value;
use signalpost_proto::api::RelayStats;
use signalpost_proto::{Envelope, Presence, Signal};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::rooms::{Membership, RoomRegistry};
use crate::store::{Mailbox, MessageStore};

/// Result of a successfully applied signaling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The peer joined; carries the room's members after the join.
    Joined {
        /// Sorted member list, the joiner included.
        participants: Vec<String>,
    },
    /// The request was applied and needs no payload in reply.
    Accepted,
}

/// Shared relay state: room membership plus pending per-peer queues.
pub struct RelayService {
    rooms: Arc<dyn Membership>,
    mailbox: Arc<dyn Mailbox>,
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayService {
    /// Creates a relay backed by fresh in-memory stores with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backends(Arc::new(RoomRegistry::new()), Arc::new(MessageStore::new()))
    }

    /// Creates a relay whose in-memory queues follow the configured limits.
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        let store = MessageStore::with_limits(config.max_queue_size, config.queue_warn_threshold);
        Self::with_backends(Arc::new(RoomRegistry::new()), Arc::new(store))
    }

    /// Creates a relay over caller-supplied storage backends.
    #[must_use]
    pub fn with_backends(rooms: Arc<dyn Membership>, mailbox: Arc<dyn Mailbox>) -> Self {
        Self { rooms, mailbox }
    }

    /// Room membership backend.
    #[must_use]
    pub fn rooms(&self) -> &dyn Membership {
        self.rooms.as_ref()
    }

    /// Pending-queue backend.
    #[must_use]
    pub fn mailbox(&self) -> &dyn Mailbox {
        self.mailbox.as_ref()
    }

    /// Validates a decoded request body and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Signal`] if the body fails validation. In that
    /// case no store has been touched.
    pub async fn handle_value(&self, value: Value) -> Result<SignalOutcome, RelayError> {
        let signal = Signal::parse(value).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected signaling request");
        })?;
        Ok(self.handle(signal).await)
    }

    /// Applies a validated signaling request.
    pub async fn handle(&self, signal: Signal) -> SignalOutcome {
        match signal {
            Signal::Join(Presence { from, room }) => {
                let participants = self.rooms.join(&room, &from).await;
                tracing::info!(
                    peer_id = %from,
                    room_id = %room,
                    count = participants.len(),
                    "peer joined room"
                );
                SignalOutcome::Joined { participants }
            }
            Signal::Leave(Presence { from, room }) => {
                self.rooms.leave(&room, &from).await;
                tracing::info!(peer_id = %from, room_id = %room, "peer left room");
                SignalOutcome::Accepted
            }
            Signal::Offer(envelope) | Signal::Answer(envelope) | Signal::IceCandidate(envelope) => {
                self.route(envelope).await;
                SignalOutcome::Accepted
            }
        }
    }

    /// Queues an envelope for its recipient.
    async fn route(&self, envelope: Envelope) {
        let to = envelope.to().to_string();
        tracing::debug!(
            from = %envelope.from(),
            to = %to,
            kind = %envelope.kind(),
            "routing envelope"
        );
        let count = self.mailbox.enqueue(&to, envelope).await;
        tracing::debug!(to = %to, count = count, "envelope queued");
    }

    /// Drains everything queued for `user_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingUserId`] if `user_id` is empty.
    pub async fn poll(&self, user_id: &str) -> Result<Vec<Envelope>, RelayError> {
        if user_id.is_empty() {
            tracing::warn!("poll without userId");
            return Err(RelayError::MissingUserId);
        }
        let messages = self.mailbox.drain(user_id).await;
        tracing::debug!(peer_id = %user_id, count = messages.len(), "poll drained queue");
        Ok(messages)
    }

    /// Returns current resource usage of both stores.
    pub async fn stats(&self) -> RelayStats {
        let rooms = self.rooms.stats().await;
        let queues = self.mailbox.stats().await;
        RelayStats {
            rooms: rooms.rooms,
            participants: rooms.participants,
            largest_room: rooms.largest,
            queues: queues.queues,
            queued_envelopes: queues.envelopes,
            largest_queue: queues.longest,
        }
    }
}
