//! In-memory per-peer mailbox for relayed signaling envelopes.
//!
//! The [`MessageStore`] holds one FIFO queue per destination peer. Envelopes
//! accumulate until the peer polls; a poll drains the whole queue at once and
//! removes it, so an envelope is delivered at most once.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use async_trait::async_trait;
use dashmap::DashMap;
use signalpost_proto::Envelope;

/// Default queue length at which a warning is logged.
pub const DEFAULT_QUEUE_WARN_THRESHOLD: usize = 256;

/// Storage seam for pending envelopes.
///
/// [`crate::relay::RelayService`] only reaches its queues through this
/// trait, so a shared backend can stand in for [`MessageStore`].
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Appends `envelope` to `peer_id`'s queue, returning the new length.
    async fn enqueue(&self, peer_id: &str, envelope: Envelope) -> usize;

    /// Removes and returns everything queued for `peer_id`, oldest first.
    async fn drain(&self, peer_id: &str) -> Vec<Envelope>;

    /// Number of envelopes waiting for `peer_id`.
    async fn queue_len(&self, peer_id: &str) -> usize;

    /// Aggregate counters over all queues.
    async fn stats(&self) -> QueueStats;
}

/// Aggregate counters over all queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Peers with a non-empty queue.
    pub queues: usize,
    /// Envelopes over all queues.
    pub envelopes: usize,
    /// Length of the longest queue.
    pub longest: usize,
}

/// In-memory per-peer FIFO queues.
///
/// Queues live in a [`DashMap`] keyed by peer id, so enqueue and drain
/// lock only the shard holding that peer. Enqueue runs under the entry's
/// write guard and drain removes the entry outright, which makes a drain
/// observe either all or none of a racing enqueue.
///
/// Queues are unbounded unless a cap is configured; with a cap, the oldest
/// envelope is evicted to make room.
pub struct MessageStore {
    queues: DashMap<String, VecDeque<Envelope>>,
    max_queue_size: Option<NonZeroUsize>,
    warn_threshold: usize,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    /// Creates an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
            max_queue_size: None,
            warn_threshold: DEFAULT_QUEUE_WARN_THRESHOLD,
        }
    }

    /// Creates an empty store with an optional per-peer cap and a warning
    /// threshold.
    ///
    /// The cap is non-zero so a push always leaves at least the newest
    /// envelope behind; a queue in the map is never empty.
    #[must_use]
    pub fn with_limits(max_queue_size: Option<NonZeroUsize>, warn_threshold: usize) -> Self {
        Self {
            queues: DashMap::new(),
            max_queue_size,
            warn_threshold,
        }
    }

    /// Appends an envelope to a peer's queue, returning the new queue length.
    pub fn push(&self, peer_id: &str, envelope: Envelope) -> usize {
        let mut queue = self.queues.entry(peer_id.to_string()).or_default();
        queue.push_back(envelope);

        if let Some(max) = self.max_queue_size
            && queue.len() > max.get()
        {
            queue.pop_front();
            tracing::warn!(peer_id = %peer_id, max = max, "queue full, evicted oldest envelope");
        }

        let len = queue.len();
        drop(queue);

        if len == self.warn_threshold {
            tracing::warn!(
                peer_id = %peer_id,
                len = len,
                "pending queue reached warning threshold; peer may not be polling"
            );
        }
        len
    }

    /// Removes a peer's queue and returns its envelopes in FIFO order.
    ///
    /// Returns an empty `Vec` if nothing was queued. The queue is absent
    /// afterwards, not merely empty.
    pub fn take(&self, peer_id: &str) -> Vec<Envelope> {
        self.queues
            .remove(peer_id)
            .map(|(_, queue)| queue.into())
            .unwrap_or_default()
    }

    /// Returns the number of envelopes currently queued for a peer.
    #[must_use]
    pub fn len_of(&self, peer_id: &str) -> usize {
        self.queues.get(peer_id).map_or(0, |q| q.len())
    }

    /// Returns aggregate counters over all queues.
    #[must_use]
    pub fn snapshot_stats(&self) -> QueueStats {
        self.queues
            .iter()
            .fold(QueueStats::default(), |mut acc, entry| {
                let len = entry.value().len();
                acc.queues += 1;
                acc.envelopes += len;
                acc.longest = acc.longest.max(len);
                acc
            })
    }
}

#[async_trait]
impl Mailbox for MessageStore {
    async fn enqueue(&self, peer_id: &str, envelope: Envelope) -> usize {
        self.push(peer_id, envelope)
    }

    async fn drain(&self, peer_id: &str) -> Vec<Envelope> {
        self.take(peer_id)
    }

    async fn queue_len(&self, peer_id: &str) -> usize {
        self.len_of(peer_id)
    }

    async fn stats(&self) -> QueueStats {
        self.snapshot_stats()
    }
}
