//! Room membership registry for the relay.
//!
//! Tracks which peers are currently present in which room. Rooms come into
//! existence on first join and disappear when their last peer leaves; an
//! empty room and a missing room are indistinguishable to callers.
//!
//! Membership is ephemeral, lost on relay restart like the pending queues.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;

/// Storage seam for room membership.
///
/// [`crate::relay::RelayService`] only reaches rooms through this trait, so
/// a shared backend can stand in for [`RoomRegistry`].
#[async_trait]
pub trait Membership: Send + Sync {
    /// Adds `peer_id` to `room_id` and returns the resulting member list.
    async fn join(&self, room_id: &str, peer_id: &str) -> Vec<String>;

    /// Removes `peer_id` from `room_id`; absent peers and rooms are ignored.
    async fn leave(&self, room_id: &str, peer_id: &str);

    /// Current member list of `room_id`.
    async fn snapshot(&self, room_id: &str) -> Vec<String>;

    /// Aggregate room counters.
    async fn stats(&self) -> RoomStats;
}

/// Aggregate counters over all rooms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomStats {
    /// Rooms with at least one member.
    pub rooms: usize,
    /// Members summed over all rooms.
    pub participants: usize,
    /// Member count of the largest room.
    pub largest: usize,
}

/// In-memory room directory.
///
/// Each room's member set sits behind its own [`DashMap`] entry, so joins
/// and leaves on different rooms do not wait on each other. A join inserts
/// and snapshots under one entry guard, which is what lets the joiner
/// always see itself in the returned list.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashSet<String>>,
}

impl RoomRegistry {
    /// Creates a new, empty room registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a peer to a room, creating the room if needed.
    ///
    /// Re-joining is a no-op. Returns the members after the join, sorted.
    pub fn add(&self, room_id: &str, peer_id: &str) -> Vec<String> {
        let mut members = self.rooms.entry(room_id.to_string()).or_default();
        members.insert(peer_id.to_string());
        sorted(&members)
    }

    /// Removes a peer from a room.
    ///
    /// Returns `true` if the peer was present. A room left empty is dropped.
    pub fn remove(&self, room_id: &str, peer_id: &str) -> bool {
        let removed = self
            .rooms
            .get_mut(room_id)
            .is_some_and(|mut members| members.remove(peer_id));
        if removed {
            self.rooms.remove_if(room_id, |_, members| members.is_empty());
        }
        removed
    }

    /// Returns the sorted member list of a room, empty if it does not exist.
    #[must_use]
    pub fn members(&self, room_id: &str) -> Vec<String> {
        self.rooms
            .get(room_id)
            .map(|members| sorted(&members))
            .unwrap_or_default()
    }

    /// Returns aggregate counters over all rooms.
    #[must_use]
    pub fn snapshot_stats(&self) -> RoomStats {
        self.rooms
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .fold(RoomStats::default(), |mut acc, entry| {
                let len = entry.value().len();
                acc.rooms += 1;
                acc.participants += len;
                acc.largest = acc.largest.max(len);
                acc
            })
    }
}

#[async_trait]
impl Membership for RoomRegistry {
    async fn join(&self, room_id: &str, peer_id: &str) -> Vec<String> {
        self.add(room_id, peer_id)
    }

    async fn leave(&self, room_id: &str, peer_id: &str) {
        self.remove(room_id, peer_id);
    }

    async fn snapshot(&self, room_id: &str) -> Vec<String> {
        self.members(room_id)
    }

    async fn stats(&self) -> RoomStats {
        self.snapshot_stats()
    }
}

fn sorted(members: &HashSet<String>) -> Vec<String> {
    let mut list: Vec<String> = members.iter().cloned().collect();
    list.sort_unstable();
    list
}
