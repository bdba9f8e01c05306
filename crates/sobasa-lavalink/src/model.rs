//! Wire types of the Lavalink v4 REST API and event WebSocket.

use crate::error::LavalinkError;
use crate::filters::Filters;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sobasa_types::{CommunityId, Requester, Track, TrackInfo};

/// Key under a track's `userData` that carries the requester.
const REQUESTER_KEY: &str = "requester";

/// A track as Lavalink serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LavalinkTrack {
    pub encoded: String,
    pub info: TrackInfo,
    #[serde(default)]
    pub plugin_info: Value,
    #[serde(default)]
    pub user_data: Value,
}

impl LavalinkTrack {
    /// Converts into the shared track model, recovering the requester from
    /// `userData` when present.
    pub fn into_track(self) -> Track {
        let requester = self
            .user_data
            .get(REQUESTER_KEY)
            .cloned()
            .and_then(|value| serde_json::from_value::<Requester>(value).ok());
        Track {
            encoded: self.encoded,
            info: self.info,
            requester,
        }
    }
}

/// The `userData` object attached to a track we start.
pub fn user_data(requester: Option<&Requester>) -> Option<Value> {
    requester.map(|requester| json!({ REQUESTER_KEY: requester }))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    pub name: String,
    #[serde(default)]
    pub selected_track: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Playlist {
    pub info: PlaylistInfo,
    pub tracks: Vec<LavalinkTrack>,
}

/// Error details reported by Lavalink for failed loads and track exceptions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Exception {
    #[serde(default)]
    pub message: Option<String>,
    pub severity: String,
    #[serde(default)]
    pub cause: String,
}

impl Exception {
    pub fn describe(&self) -> String {
        match &self.message {
            Some(message) => format!("{message} ({})", self.severity),
            None => format!("{} ({})", self.cause, self.severity),
        }
    }
}

/// Response of `GET /v4/loadtracks`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "loadType", content = "data", rename_all = "camelCase")]
pub enum LoadResult {
    Track(LavalinkTrack),
    Playlist(Playlist),
    Search(Vec<LavalinkTrack>),
    Empty(Value),
    Error(Exception),
}

impl LoadResult {
    /// Flattens the result into playable tracks. A playlist's selected
    /// track, if any, comes first.
    pub fn into_tracks(self) -> Result<Vec<Track>, LavalinkError> {
        let tracks = match self {
            Self::Track(track) => vec![track],
            Self::Playlist(mut playlist) => {
                let selected = usize::try_from(playlist.info.selected_track).ok();
                if let Some(index) = selected.filter(|&i| i < playlist.tracks.len()) {
                    let track = playlist.tracks.remove(index);
                    playlist.tracks.insert(0, track);
                }
                playlist.tracks
            }
            Self::Search(tracks) => tracks,
            Self::Empty(_) => Vec::new(),
            Self::Error(exception) => return Err(LavalinkError::LoadFailed(exception.describe())),
        };
        Ok(tracks.into_iter().map(LavalinkTrack::into_track).collect())
    }
}

/// Error body returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Voice credentials from the chat platform, forwarded to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceState {
    pub token: String,
    pub endpoint: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerTrack {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Value>,
}

/// Body of `PATCH /v4/sessions/{session}/players/{guild}`. Absent fields are
/// left unchanged by Lavalink.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<UpdatePlayerTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceState>,
}

impl UpdatePlayer {
    /// Starts `track`, attaching its requester as user data.
    pub fn play(track: &Track) -> Self {
        Self {
            track: Some(UpdatePlayerTrack {
                encoded: Some(track.encoded.clone()),
                user_data: user_data(track.requester.as_ref()),
            }),
            ..Self::default()
        }
    }
}

/// Messages received on the event WebSocket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum IncomingMessage {
    Ready(Ready),
    PlayerUpdate(PlayerUpdate),
    Stats(Stats),
    Event(Event),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ready {
    pub resumed: bool,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub guild_id: CommunityId,
    pub state: PlayerState,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerState {
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub ping: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub players: u32,
    pub playing_players: u32,
    pub uptime: u64,
}

/// Why a track stopped, as reported by Lavalink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "TrackStartEvent", rename_all = "camelCase")]
    TrackStart {
        guild_id: CommunityId,
        track: LavalinkTrack,
    },
    #[serde(rename = "TrackEndEvent", rename_all = "camelCase")]
    TrackEnd {
        guild_id: CommunityId,
        track: LavalinkTrack,
        reason: EndReason,
    },
    #[serde(rename = "TrackExceptionEvent", rename_all = "camelCase")]
    TrackException {
        guild_id: CommunityId,
        track: LavalinkTrack,
        exception: Exception,
    },
    #[serde(rename = "TrackStuckEvent", rename_all = "camelCase")]
    TrackStuck {
        guild_id: CommunityId,
        track: LavalinkTrack,
        threshold_ms: u64,
    },
    #[serde(rename = "WebSocketClosedEvent", rename_all = "camelCase")]
    WebSocketClosed {
        guild_id: CommunityId,
        code: u16,
        reason: String,
        by_remote: bool,
    },
}
