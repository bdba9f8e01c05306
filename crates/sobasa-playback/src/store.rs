//! The session store: at most one live playback session per community.

use crate::backend::{SessionBinding, DEFAULT_VOLUME};
use sobasa_types::{ChannelId, CommunityId, FilterChainState, Track};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Unique identity of one session incarnation. A community that gets a new
/// session after teardown gets a new id, which lets late writers detect that
/// the session they validated is gone.
pub type SessionId = Uuid;

/// One live binding between the bot and a voice room.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub community: CommunityId,
    pub voice_room: ChannelId,
    pub text_channel: ChannelId,
    pub connected: bool,
    /// The track being rendered.
    pub current: Option<Track>,
    /// The next track, waiting for `play`.
    pub queued: Option<Track>,
    pub filters: FilterChainState,
    pub volume: u16,
    pub playing: bool,
    pub paused: bool,
}

impl PlaybackSession {
    pub fn new(binding: SessionBinding) -> Self {
        Self {
            id: Uuid::new_v4(),
            community: binding.community,
            voice_room: binding.voice_room,
            text_channel: binding.text_channel,
            connected: false,
            current: None,
            queued: None,
            filters: FilterChainState::default(),
            volume: DEFAULT_VOLUME,
            playing: false,
            paused: false,
        }
    }

    pub fn binding(&self) -> SessionBinding {
        SessionBinding {
            community: self.community,
            voice_room: self.voice_room,
            text_channel: self.text_channel,
        }
    }
}

/// Owns every live session. Callers receive clones; mutation goes through
/// [`SessionStore::update`], which is keyed by session id so a writer that
/// suspended in between cannot touch a successor session.
///
/// Uses `std::sync::Mutex`: all acquisitions are brief map operations that
/// never span an `.await`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<CommunityId, PlaybackSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the community's session.
    pub fn get(&self, community: CommunityId) -> Option<PlaybackSession> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&community)
            .cloned()
    }

    pub fn contains(&self, community: CommunityId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&community)
    }

    /// Stores `session`. Returns the session it displaced, which callers
    /// holding the community's lifecycle lock never produce.
    pub fn insert(&self, session: PlaybackSession) -> Option<PlaybackSession> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.community, session)
    }

    /// Removes the community's session.
    pub fn remove(&self, community: CommunityId) -> Option<PlaybackSession> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&community)
    }

    /// Removes the community's session only if it is still `id`.
    pub fn remove_if(&self, community: CommunityId, id: SessionId) -> Option<PlaybackSession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get(&community) {
            Some(session) if session.id == id => sessions.remove(&community),
            _ => None,
        }
    }

    /// Applies `f` to the community's session if it is still `id`.
    /// Returns `None` when the session was replaced or removed.
    pub fn update<R>(
        &self,
        community: CommunityId,
        id: SessionId,
        f: impl FnOnce(&mut PlaybackSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .get_mut(&community)
            .filter(|session| session.id == id)
            .map(f)
    }

    /// Ids of communities with a live session.
    pub fn communities(&self) -> Vec<CommunityId> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
