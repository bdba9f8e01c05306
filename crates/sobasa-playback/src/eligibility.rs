//! Which room, if any, the bot may join on its own.

use crate::suppression::SuppressionSet;
use rand::seq::SliceRandom;
use rand::Rng;
use sobasa_types::{ChannelId, CommunitySnapshot, RoomSnapshot};

/// Whether `room` may receive an autonomous join.
///
/// A room qualifies when it is voice-capable, is not the AFK sink, is not
/// suppressed, and has at least one human occupant.
pub fn is_eligible(
    snapshot: &CommunitySnapshot,
    room: &RoomSnapshot,
    suppression: &SuppressionSet,
) -> bool {
    room.kind.is_voice_capable()
        && snapshot.afk_room != Some(room.id)
        && !suppression.is_suppressed(snapshot.id, room.id)
        && room.human_count() > 0
}

/// Picks one eligible room uniformly at random.
pub fn select_room<R: Rng + ?Sized>(
    snapshot: &CommunitySnapshot,
    suppression: &SuppressionSet,
    rng: &mut R,
) -> Option<ChannelId> {
    let eligible: Vec<ChannelId> = snapshot
        .rooms
        .iter()
        .filter(|room| is_eligible(snapshot, room, suppression))
        .map(|room| room.id)
        .collect();
    eligible.choose(rng).copied()
}
