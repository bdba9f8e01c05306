//! In-memory view of the guilds the bot is in, fed by gateway dispatches.

use crate::model::{Channel, Guild, User, VoiceState};
use sobasa_playback::Directory;
use sobasa_types::{
    ChannelId, ChannelKind, CommunityId, CommunitySnapshot, Occupant, Requester, RoomSnapshot,
    UserId,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// A room whose human occupancy changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancyChange {
    pub community: CommunityId,
    pub room: ChannelId,
    pub humans: usize,
}

#[derive(Debug, Default)]
struct GuildEntry {
    afk_room: Option<ChannelId>,
    channels: BTreeMap<ChannelId, ChannelKind>,
    voice: HashMap<UserId, ChannelId>,
    bots: HashSet<UserId>,
}

#[derive(Debug, Default)]
struct CacheState {
    current_user: Option<User>,
    guilds: HashMap<CommunityId, GuildEntry>,
}

impl CacheState {
    fn is_bot(&self, entry: &GuildEntry, user: UserId) -> bool {
        entry.bots.contains(&user) || self.current_user.as_ref().is_some_and(|u| u.id == user)
    }

    fn humans_in(&self, entry: &GuildEntry, room: ChannelId) -> usize {
        entry
            .voice
            .iter()
            .filter(|(user, at)| **at == room && !self.is_bot(entry, **user))
            .count()
    }
}

#[derive(Debug, Default)]
pub struct GuildCache {
    state: Mutex<CacheState>,
}

impl GuildCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_user(&self, user: User) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).current_user = Some(user);
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .current_user
            .as_ref()
            .map(|u| u.id)
    }

    /// Replaces everything known about `guild`.
    pub fn upsert_guild(&self, guild: &Guild) {
        let mut entry = GuildEntry {
            afk_room: guild.afk_channel_id,
            ..GuildEntry::default()
        };
        for channel in &guild.channels {
            entry.channels.insert(channel.id, channel.channel_kind());
        }
        for user in guild.members.iter().filter_map(|m| m.user.as_ref()) {
            if user.bot {
                entry.bots.insert(user.id);
            }
        }
        for state in &guild.voice_states {
            if state.is_bot() == Some(true) {
                entry.bots.insert(state.user_id);
            }
            if let Some(room) = state.channel_id {
                entry.voice.insert(state.user_id, room);
            }
        }

        tracing::debug!(
            community = %guild.id,
            channels = entry.channels.len(),
            in_voice = entry.voice.len(),
            "cached guild"
        );
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .guilds
            .insert(guild.id, entry);
    }

    pub fn remove_guild(&self, community: CommunityId) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .guilds
            .remove(&community)
            .is_some()
    }

    pub fn upsert_channel(&self, channel: &Channel) {
        let Some(community) = channel.guild_id else {
            return;
        };
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = state.guilds.get_mut(&community) {
            entry.channels.insert(channel.id, channel.channel_kind());
        }
    }

    /// Forgets a channel and everyone connected to it.
    pub fn remove_channel(&self, community: CommunityId, room: ChannelId) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entry) = state.guilds.get_mut(&community) else {
            return false;
        };
        entry.voice.retain(|_, at| *at != room);
        if entry.afk_room == Some(room) {
            entry.afk_room = None;
        }
        entry.channels.remove(&room).is_some()
    }

    /// Records a voice state and reports the rooms whose human count
    /// changed because of it. Bot movements are not reported.
    pub fn apply_voice_state(&self, voice: &VoiceState) -> Vec<OccupancyChange> {
        let Some(community) = voice.guild_id else {
            return Vec::new();
        };
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entry) = guard.guilds.get_mut(&community) else {
            return Vec::new();
        };

        match voice.is_bot() {
            Some(true) => {
                entry.bots.insert(voice.user_id);
            }
            Some(false) => {
                entry.bots.remove(&voice.user_id);
            }
            None => {}
        }
        let previous = match voice.channel_id {
            Some(room) => entry.voice.insert(voice.user_id, room),
            None => entry.voice.remove(&voice.user_id),
        };
        if previous == voice.channel_id {
            return Vec::new();
        }

        let state = &*guard;
        let Some(entry) = state.guilds.get(&community) else {
            return Vec::new();
        };
        if state.is_bot(entry, voice.user_id) {
            return Vec::new();
        }
        [previous, voice.channel_id]
            .into_iter()
            .flatten()
            .map(|room| OccupancyChange {
                community,
                room,
                humans: state.humans_in(entry, room),
            })
            .collect()
    }

    /// The voice room `user` is connected to, if any.
    pub fn voice_room(&self, community: CommunityId, user: UserId) -> Option<ChannelId> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .guilds
            .get(&community)
            .and_then(|entry| entry.voice.get(&user).copied())
    }
}

impl Directory for GuildCache {
    fn communities(&self) -> Vec<CommunityId> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<CommunityId> = state.guilds.keys().copied().collect();
        ids.sort();
        ids
    }

    fn snapshot(&self, community: CommunityId) -> Option<CommunitySnapshot> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let entry = state.guilds.get(&community)?;
        let rooms = entry
            .channels
            .iter()
            .map(|(&id, &kind)| RoomSnapshot {
                id,
                kind,
                occupants: entry
                    .voice
                    .iter()
                    .filter(|(_, at)| **at == id)
                    .map(|(&user_id, _)| Occupant {
                        user_id,
                        bot: state.is_bot(entry, user_id),
                    })
                    .collect(),
            })
            .collect();
        Some(CommunitySnapshot {
            id: community,
            afk_room: entry.afk_room,
            rooms,
        })
    }

    fn current_user(&self) -> Option<Requester> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .current_user
            .as_ref()
            .map(Requester::from)
    }
}
