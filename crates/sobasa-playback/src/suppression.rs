//! Per-room opt-out of autonomous joins.

use sobasa_types::{ChannelId, CommunityId};
use std::collections::HashSet;
use std::sync::Mutex;

/// Rooms that have temporarily opted out of ambient playback.
///
/// Uses `std::sync::Mutex`: every acquisition is a single set operation that
/// never spans an `.await`.
#[derive(Debug, Default)]
pub struct SuppressionSet {
    entries: Mutex<HashSet<(CommunityId, ChannelId)>>,
}

impl SuppressionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the entry for `(community, room)` and returns whether the room
    /// is suppressed afterwards.
    pub fn toggle(&self, community: CommunityId, room: ChannelId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(&(community, room)) {
            false
        } else {
            entries.insert((community, room));
            true
        }
    }

    pub fn is_suppressed(&self, community: CommunityId, room: ChannelId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(community, room))
    }

    /// Removes the entry if present. Returns whether one was removed.
    pub fn clear(&self, community: CommunityId, room: ChannelId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(community, room))
    }

    /// Drops every entry belonging to `community`.
    pub fn clear_community(&self, community: CommunityId) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(c, _)| *c != community);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
